//! Submodule tree
//!
//! Snapshots list every submodule recursively with its absolute working
//! directory but without saying which module contains it. The containing
//! module is recovered from the paths alone: among all submodule paths and
//! the open module's chain of superprojects, the nearest one that encloses
//! a submodule is its super project.

use crate::config::SubmodulesConfig;
use crate::error::{Cancelled, TreeError};
use crate::services::repo::{ModuleChain, RepoQuery, SubmoduleInfo, SubmoduleInfoResult};
use crate::view::tree::node::{SubmoduleFolderNode, SubmoduleNode};
use crate::view::tree::{AncestorIndex, NodeKind, Nodes, PathGrouper, SubmoduleLabel};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn load(
    query: Arc<dyn RepoQuery>,
    snapshot: Arc<SubmoduleInfoResult>,
    settings: SubmodulesConfig,
    token: CancellationToken,
) -> anyhow::Result<Nodes> {
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    let chain = query.module_chain().await?;
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(build(&snapshot, &chain, &settings)?)
}

/// Attribute every displayed submodule to its super project
pub fn submodule_nodes(
    snapshot: &SubmoduleInfoResult,
    chain: &ModuleChain,
    label: SubmoduleLabel,
) -> Result<Vec<SubmoduleNode>, TreeError> {
    let infos = snapshot.displayed();
    let index = AncestorIndex::new(
        infos
            .iter()
            .map(|info| info.path.as_str())
            .chain(chain.modules().iter().map(String::as_str)),
    );

    infos
        .iter()
        .map(|info| submodule_node(&index, chain.top(), info, label))
        .collect()
}

fn submodule_node(
    index: &AncestorIndex,
    top: &str,
    info: &SubmoduleInfo,
    label: SubmoduleLabel,
) -> Result<SubmoduleNode, TreeError> {
    let super_path = index.owner_of(&info.path)?.to_string();
    let local_path = info
        .path
        .strip_prefix(super_path.as_str())
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();
    let relative_path = format!(
        "{}{}",
        super_path.strip_prefix(top).unwrap_or_default(),
        local_path
    );

    Ok(SubmoduleNode {
        info: info.clone(),
        is_current: info.bold,
        local_path,
        super_path,
        relative_path,
        label,
        details: None,
    })
}

pub fn build(
    snapshot: &SubmoduleInfoResult,
    chain: &ModuleChain,
    settings: &SubmodulesConfig,
) -> Result<Nodes, TreeError> {
    let label = if settings.use_folder_tree {
        SubmoduleLabel::Name
    } else {
        SubmoduleLabel::RawText
    };
    let submodules = submodule_nodes(snapshot, chain, label)?;

    let mut nodes = Nodes::new();
    if !settings.use_folder_tree {
        nodes.add_nodes(None, submodules.into_iter().map(NodeKind::Submodule))?;
        return Ok(nodes);
    }

    PathGrouper::default()
        .with_policy(settings.inner_leaf_policy)
        .group(
            submodules
                .into_iter()
                .map(|submodule| (submodule.relative_path.clone(), submodule)),
        )
        .into_nodes(
            &mut nodes,
            None,
            |segment, path| {
                NodeKind::SubmoduleFolder(SubmoduleFolderNode {
                    name: segment.to_string(),
                    path: path.to_string(),
                })
            },
            |_, submodule| NodeKind::Submodule(submodule),
        )?;

    Ok(nodes)
}
