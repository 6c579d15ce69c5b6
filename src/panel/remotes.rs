//! Remote tree: one node per remote, its tracking branches grouped below

use crate::error::{Cancelled, TreeError};
use crate::services::repo::{RefDescriptor, RemoteDescriptor, RepoQuery};
use crate::view::tree::node::{BranchPathNode, RemoteBranchNode, RemoteRepoNode};
use crate::view::tree::{NodeKind, Nodes, PathGrouper};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn load(query: Arc<dyn RepoQuery>, token: CancellationToken) -> anyhow::Result<Nodes> {
    let remotes = query.remotes().await?;
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    let branches = query.remote_branches().await?;
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(build(remotes, branches)?)
}

/// Longest remote name that prefixes `name` as `<remote>/...`
fn split_remote<'a>(remotes: &[RemoteDescriptor], name: &'a str) -> Option<(String, &'a str)> {
    remotes
        .iter()
        .filter_map(|remote| {
            name.strip_prefix(remote.name.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|branch| !branch.is_empty())
                .map(|branch| (remote.name.clone(), branch))
        })
        .max_by_key(|(remote, _)| remote.len())
}

pub fn build(
    remotes: Vec<RemoteDescriptor>,
    branches: Vec<RefDescriptor>,
) -> Result<Nodes, TreeError> {
    let mut per_remote: HashMap<String, Vec<(String, RefDescriptor)>> = HashMap::new();
    for branch in branches {
        match split_remote(&remotes, &branch.name) {
            Some((remote, name)) => {
                let name = name.to_string();
                per_remote.entry(remote).or_default().push((name, branch));
            }
            None => {
                tracing::warn!(name = %branch.name, "remote branch of unknown remote, skipping");
            }
        }
    }

    let mut nodes = Nodes::new();
    let mut seen = HashSet::new();
    for remote in remotes {
        if !seen.insert(remote.name.clone()) {
            tracing::warn!(name = %remote.name, "remote listed twice, keeping the first");
            continue;
        }
        let parent = nodes.add_node(
            None,
            NodeKind::RemoteRepo(RemoteRepoNode {
                name: remote.name.clone(),
                enabled: remote.enabled,
            }),
        )?;

        let Some(branches) = per_remote.remove(&remote.name) else {
            continue;
        };
        let name = remote.name;
        PathGrouper::default().group(branches).into_nodes(
            &mut nodes,
            Some(parent),
            |_, path| {
                NodeKind::BranchPath(BranchPathNode {
                    full_path: format!("{name}/{path}"),
                })
            },
            |path, branch| {
                NodeKind::RemoteBranch(RemoteBranchNode {
                    remote: name.clone(),
                    branch: path.to_string(),
                    object_id: branch.object_id,
                })
            },
        )?;
    }

    Ok(nodes)
}
