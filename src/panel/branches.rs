//! Local branch tree

use crate::error::{Cancelled, TreeError};
use crate::services::repo::{RefDescriptor, RepoQuery};
use crate::view::tree::node::{BranchPathNode, LocalBranchNode};
use crate::view::tree::{NodeKind, Nodes, PathGrouper};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn load(query: Arc<dyn RepoQuery>, token: CancellationToken) -> anyhow::Result<Nodes> {
    let branches = query.local_branches().await?;
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(build(branches)?)
}

/// Group branch names by `/` into `BranchPath` folders
pub fn build(branches: Vec<RefDescriptor>) -> Result<Nodes, TreeError> {
    let mut nodes = Nodes::new();
    let grouping = PathGrouper::default().group(
        branches
            .into_iter()
            .map(|branch| (branch.name.clone(), branch)),
    );

    grouping.into_nodes(
        &mut nodes,
        None,
        |_, path| {
            NodeKind::BranchPath(BranchPathNode {
                full_path: path.to_string(),
            })
        },
        |path, branch| {
            NodeKind::LocalBranch(LocalBranchNode {
                full_path: path.to_string(),
                object_id: branch.object_id,
                is_active: branch.is_current_branch,
            })
        },
    )?;

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::repo::{MemoryRepo, MemoryRepoQuery};
    use crate::view::tree::VariantTag;

    #[test]
    fn test_branches_grouped_by_path() {
        let nodes = build(vec![
            RefDescriptor::new("refs/heads/main", "1").current(),
            RefDescriptor::new("refs/heads/feature/a", "2"),
            RefDescriptor::new("refs/heads/feature/b", "3"),
        ])
        .unwrap();

        assert_eq!(nodes.root_count(), 2);
        let labels: Vec<_> = nodes.depth_first().map(|n| n.display_text()).collect();
        assert_eq!(labels, vec!["main", "feature", "a", "b"]);

        let folder = nodes.depth_first().nth(1).unwrap();
        assert_eq!(folder.variant(), VariantTag::BranchPath);
        assert_eq!(folder.key().path, "feature");

        let main = nodes.depth_first().next().unwrap();
        let main = main.as_variant::<LocalBranchNode>().unwrap();
        assert!(main.is_active);
        assert_eq!(main.object_id, "1");
    }

    #[tokio::test]
    async fn test_load_respects_cancellation() {
        let query: Arc<dyn RepoQuery> = Arc::new(MemoryRepoQuery::new(MemoryRepo {
            branches: vec![RefDescriptor::new("refs/heads/main", "1")],
            ..MemoryRepo::default()
        }));

        let token = CancellationToken::new();
        assert_eq!(load(query.clone(), token.clone()).await.unwrap().len(), 1);

        token.cancel();
        let err = load(query, token).await.unwrap_err();
        assert!(err.downcast_ref::<Cancelled>().is_some());
    }
}
