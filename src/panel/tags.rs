//! Tag tree

use crate::error::{Cancelled, TreeError};
use crate::services::repo::{RefDescriptor, RepoQuery};
use crate::view::tree::node::{BranchPathNode, TagNode};
use crate::view::tree::{NodeKind, Nodes, PathGrouper};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn load(query: Arc<dyn RepoQuery>, token: CancellationToken) -> anyhow::Result<Nodes> {
    let tags = query.tags().await?;
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(build(tags)?)
}

/// Sort tags by name and group them by `/`
pub fn build(mut tags: Vec<RefDescriptor>) -> Result<Nodes, TreeError> {
    tags.sort_by(|a, b| a.name.cmp(&b.name));

    let mut nodes = Nodes::new();
    PathGrouper::default()
        .group(tags.into_iter().map(|tag| (tag.name.clone(), tag)))
        .into_nodes(
            &mut nodes,
            None,
            |_, path| {
                NodeKind::BranchPath(BranchPathNode {
                    full_path: path.to_string(),
                })
            },
            |path, tag| {
                NodeKind::Tag(TagNode {
                    full_path: path.to_string(),
                    object_id: tag.object_id,
                })
            },
        )?;

    Ok(nodes)
}
