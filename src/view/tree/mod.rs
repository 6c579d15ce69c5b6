// Repository object trees
//
// Nodes live in an id-indexed forest; a Tree owns one forest per category of
// repository objects and rebuilds it wholesale on every reload. The grouper
// turns flat, path-qualified lists into folder hierarchies.

pub mod actions;
pub mod grouper;
pub mod node;
pub mod nodes;
#[allow(clippy::module_inception)]
pub mod tree;

pub use actions::{ActionContext, ActionRegistry, BindingId, NodeAction, TreeAction};
pub use grouper::{with_trailing_slash, AncestorIndex, Grouping, InnerLeafPolicy, PathGrouper};
pub use node::{Node, NodeId, NodeKey, NodeKind, NodeVariant, SubmoduleLabel, VariantTag};
pub use nodes::{NodeCollection, Nodes};
pub use tree::{
    event_channel, EventReceiver, EventSender, FirstFill, PanelEvent, ReloadOutcome, ReloadState,
    Tree, TreeCategory, TreeContext, TreeEvent,
};
