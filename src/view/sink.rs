use crate::view::decorations::NodeStyle;
use crate::view::tree::{NodeId, NodeKey};

/// One rendered node, in pre-order
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub node: NodeId,
    pub key: NodeKey,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub text: String,
    pub style: NodeStyle,
    pub has_children: bool,
}

/// The view subtree a [`Tree`](crate::view::tree::Tree) renders into
///
/// The tree owns its nodes; the view only holds rows derived from them. All
/// calls happen on the thread that owns the tree.
pub trait TreeView {
    /// Tear down every row and build `rows` in their place, in one pass
    ///
    /// Returns the node the view re-selected after the rebuild, if any. Views
    /// that keep a selection across rebuilds report it here so the tree can
    /// route the selection event through its own guard.
    fn rebuild(&mut self, rows: Vec<ViewRow>) -> Option<NodeId>;

    /// Push the current text and style of one node; false when `node` has no
    /// row in this view
    fn apply_style(&mut self, node: NodeId, text: &str, style: &NodeStyle) -> bool;

    fn set_header(&mut self, text: &str);

    /// Expand or collapse the header row only
    fn set_expanded(&mut self, expanded: bool);

    fn expand_all(&mut self);

    fn collapse_all(&mut self);
}
