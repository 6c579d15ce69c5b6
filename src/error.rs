//! Error types shared across the tree engine.

use crate::view::tree::{NodeId, NodeKey};
use thiserror::Error;

/// Structural failures: an invariant was broken by the caller or by upstream data.
///
/// None of these are expected at runtime. They surface as a failed reload
/// (logged at error level) rather than a panic on the interaction thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("duplicate node identity {0} within one collection")]
    DuplicateIdentity(NodeKey),

    #[error("no enclosing module path found for {path}")]
    MissingAncestor { path: String },

    #[error("{0} is not part of this tree")]
    NodeNotFound(NodeId),

    #[error("{0} is not attached to a view")]
    NotAttached(NodeId),
}

/// Returned from a fetch step that noticed its reload was superseded.
///
/// The reload boundary never reports this as a failure; the result is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reload cancelled")]
pub struct Cancelled;
