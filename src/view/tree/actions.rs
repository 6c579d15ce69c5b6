//! Context actions per node variant
//!
//! Which actions a variant supports is fixed in [`capabilities`]; whether an
//! action is offered for a particular node also depends on its state (see
//! [`is_available`]). Menu items are bound through an [`ActionRegistry`],
//! which checks the variant of the clicked node when the binding fires.

use super::node::{LocalBranchNode, Node, NodeId, NodeKind, NodeVariant, VariantTag};
use super::nodes::Nodes;
use super::tree::TreeCategory;
use crate::services::commands::RepoCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAction {
    Checkout,
    Delete,
    DeleteAll,
    FilterInRevisionGrid,
    Fetch,
    FetchAndMerge,
    CreateBranch,
    Merge,
    Rebase,
    Reset,
    FetchAndCheckout,
    FetchAndCreateBranch,
    FetchAndRebase,
    ManageRemotes,
    FetchAll,
    EnableRemote,
    EnableRemoteAndFetch,
    DisableRemote,
    Prune,
    OpenSubmodule,
    UpdateSubmodule,
    ManageSubmodules,
    SynchronizeSubmodules,
}

/// Actions on a tree as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeAction {
    CollapseAll,
    ExpandAll,
    ManageRemotes,
    UpdateAllSubmodules,
    OpenTopProject,
    OpenSuperProject,
    ManageSubmodules,
    SynchronizeSubmodules,
}

/// Everything a variant can do, in menu order
pub fn capabilities(variant: VariantTag) -> &'static [NodeAction] {
    use NodeAction::*;
    match variant {
        VariantTag::LocalBranch => &[Checkout, Delete, FilterInRevisionGrid],
        VariantTag::BranchPath => &[DeleteAll],
        VariantTag::RemoteBranch => &[
            Delete,
            Checkout,
            Fetch,
            FetchAndMerge,
            CreateBranch,
            Merge,
            Rebase,
            Reset,
            FilterInRevisionGrid,
            FetchAndCheckout,
            FetchAndCreateBranch,
            FetchAndRebase,
        ],
        VariantTag::RemoteRepo => &[
            ManageRemotes,
            FetchAll,
            EnableRemote,
            EnableRemoteAndFetch,
            DisableRemote,
            Prune,
        ],
        VariantTag::Tag => &[CreateBranch, Delete, Checkout],
        VariantTag::Submodule => &[
            OpenSubmodule,
            UpdateSubmodule,
            ManageSubmodules,
            SynchronizeSubmodules,
        ],
        VariantTag::SubmoduleFolder => &[],
    }
}

/// Tree-level actions offered on a category's header
pub fn tree_actions(category: TreeCategory) -> &'static [TreeAction] {
    use TreeAction::*;
    match category {
        TreeCategory::Branches | TreeCategory::Tags => &[CollapseAll, ExpandAll],
        TreeCategory::Remotes => &[ManageRemotes, CollapseAll, ExpandAll],
        TreeCategory::Submodules => &[
            UpdateAllSubmodules,
            OpenTopProject,
            OpenSuperProject,
            ManageSubmodules,
            SynchronizeSubmodules,
            CollapseAll,
            ExpandAll,
        ],
    }
}

/// Repository-wide facts that affect which actions are offered
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionContext {
    pub bare_repository: bool,
}

/// Whether `action` is offered for `node` in its current state
pub fn is_available(action: NodeAction, node: &Node, cx: ActionContext) -> bool {
    if !capabilities(node.variant()).contains(&action) {
        return false;
    }

    match &node.kind {
        NodeKind::LocalBranch(branch) => match action {
            NodeAction::Checkout | NodeAction::Delete => !branch.is_active,
            _ => true,
        },
        NodeKind::RemoteRepo(remote) => match action {
            NodeAction::FetchAll | NodeAction::DisableRemote | NodeAction::Prune => remote.enabled,
            NodeAction::EnableRemote | NodeAction::EnableRemoteAndFetch => !remote.enabled,
            _ => true,
        },
        NodeKind::Submodule(submodule) => match action {
            NodeAction::OpenSubmodule => submodule.can_open(),
            NodeAction::ManageSubmodules | NodeAction::SynchronizeSubmodules => {
                submodule.is_current && !cx.bare_repository
            }
            _ => true,
        },
        _ => true,
    }
}

/// Actions to show in the context menu of `node`
pub fn available_actions(node: &Node, cx: ActionContext) -> Vec<NodeAction> {
    capabilities(node.variant())
        .iter()
        .copied()
        .filter(|&action| is_available(action, node, cx))
        .collect()
}

/// The repository command an action on `id` stands for
///
/// `None` when the node is unknown or the action does not apply to it.
pub fn command_for(action: NodeAction, id: NodeId, nodes: &Nodes) -> Option<RepoCommand> {
    let node = nodes.get(id)?;

    let command = match (&node.kind, action) {
        (NodeKind::LocalBranch(b), NodeAction::Checkout) => RepoCommand::CheckoutBranch {
            name: b.full_path.clone(),
        },
        (NodeKind::LocalBranch(b), NodeAction::Delete) => RepoCommand::DeleteBranches {
            names: vec![b.full_path.clone()],
        },
        (NodeKind::LocalBranch(b), NodeAction::FilterInRevisionGrid) => {
            RepoCommand::FilterRevisionGrid {
                ref_name: b.full_path.clone(),
            }
        }

        (NodeKind::BranchPath(_), NodeAction::DeleteAll) => {
            let names: Vec<String> = nodes
                .subtree(id)
                .filter_map(|n| n.as_variant::<LocalBranchNode>())
                .map(|b| b.full_path.clone())
                .collect();
            // Folders in the tag and remote trees hold no local branches
            if names.is_empty() {
                return None;
            }
            RepoCommand::DeleteBranches { names }
        }

        (NodeKind::RemoteBranch(b), action) => {
            let remote = b.remote.clone();
            let branch = b.branch.clone();
            match action {
                NodeAction::Delete => RepoCommand::DeleteRemoteBranch { remote, branch },
                NodeAction::Checkout => RepoCommand::CheckoutRemoteBranch { remote, branch },
                NodeAction::Fetch => RepoCommand::Fetch { remote, branch },
                NodeAction::FetchAndMerge => RepoCommand::FetchAndMerge { remote, branch },
                NodeAction::CreateBranch => RepoCommand::CreateBranch {
                    start_point: b.full_path(),
                },
                NodeAction::Merge => RepoCommand::Merge {
                    ref_name: b.full_path(),
                },
                NodeAction::Rebase => RepoCommand::Rebase {
                    ref_name: b.full_path(),
                },
                NodeAction::Reset => RepoCommand::Reset {
                    object_id: b.object_id.clone(),
                },
                NodeAction::FilterInRevisionGrid => RepoCommand::FilterRevisionGrid {
                    ref_name: b.full_path(),
                },
                NodeAction::FetchAndCheckout => RepoCommand::FetchAndCheckout { remote, branch },
                NodeAction::FetchAndCreateBranch => {
                    RepoCommand::FetchAndCreateBranch { remote, branch }
                }
                NodeAction::FetchAndRebase => RepoCommand::FetchAndRebase { remote, branch },
                _ => return None,
            }
        }

        (NodeKind::RemoteRepo(r), action) => {
            let remote = r.name.clone();
            match action {
                NodeAction::ManageRemotes => RepoCommand::ManageRemotes,
                NodeAction::FetchAll => RepoCommand::FetchAll { remote },
                NodeAction::EnableRemote => RepoCommand::EnableRemote {
                    remote,
                    fetch: false,
                },
                NodeAction::EnableRemoteAndFetch => RepoCommand::EnableRemote {
                    remote,
                    fetch: true,
                },
                NodeAction::DisableRemote => RepoCommand::DisableRemote { remote },
                NodeAction::Prune => RepoCommand::Prune { remote },
                _ => return None,
            }
        }

        (NodeKind::Tag(t), NodeAction::CreateBranch) => RepoCommand::CreateBranch {
            start_point: t.full_path.clone(),
        },
        (NodeKind::Tag(t), NodeAction::Delete) => RepoCommand::DeleteTag {
            name: t.full_path.clone(),
        },
        (NodeKind::Tag(t), NodeAction::Checkout) => RepoCommand::CheckoutRevision {
            revision: t.full_path.clone(),
        },

        (NodeKind::Submodule(s), action) => match action {
            NodeAction::OpenSubmodule => RepoCommand::OpenRepository {
                path: s.info.path.clone(),
            },
            NodeAction::UpdateSubmodule => RepoCommand::UpdateSubmodule {
                path: s.local_path.clone(),
                super_path: s.super_path.clone(),
            },
            NodeAction::ManageSubmodules => RepoCommand::ManageSubmodules,
            NodeAction::SynchronizeSubmodules => RepoCommand::SynchronizeSubmodules,
            _ => return None,
        },

        _ => return None,
    };

    Some(command)
}

/// Handle returned when binding an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    variant: VariantTag,
    action: NodeAction,
}

/// Menu bindings: one per (variant, action) pair
#[derive(Debug, Default)]
pub struct ActionRegistry {
    bindings: Vec<Binding>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every capability of every variant bound
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for variant in [
            VariantTag::LocalBranch,
            VariantTag::BranchPath,
            VariantTag::RemoteBranch,
            VariantTag::RemoteRepo,
            VariantTag::Tag,
            VariantTag::Submodule,
        ] {
            for &action in capabilities(variant) {
                registry.register(variant, action);
            }
        }
        registry
    }

    /// Bind `action` to nodes of `variant`; binding the same pair twice
    /// returns the existing handle
    pub fn register(&mut self, variant: VariantTag, action: NodeAction) -> BindingId {
        let binding = Binding { variant, action };
        if let Some(index) = self.bindings.iter().position(|b| *b == binding) {
            return BindingId(index);
        }
        self.bindings.push(binding);
        BindingId(self.bindings.len() - 1)
    }

    /// Typed form of [`register`](Self::register)
    pub fn register_for<T: NodeVariant>(&mut self, action: NodeAction) -> BindingId {
        self.register(T::TAG, action)
    }

    /// Look up the binding for a pair, if registered
    pub fn find(&self, variant: VariantTag, action: NodeAction) -> Option<BindingId> {
        self.bindings
            .iter()
            .position(|b| b.variant == variant && b.action == action)
            .map(BindingId)
    }

    pub fn binding(&self, id: BindingId) -> Option<(VariantTag, NodeAction)> {
        self.bindings.get(id.0).map(|b| (b.variant, b.action))
    }

    /// The action a binding fires for `node`
    ///
    /// `None`, silently, when `node` is of another variant than the binding
    /// expects.
    pub fn resolve(&self, id: BindingId, node: &Node) -> Option<NodeAction> {
        let binding = self.bindings.get(id.0)?;
        if binding.variant != node.variant() {
            tracing::trace!(
                expected = %binding.variant,
                actual = %node.variant(),
                action = ?binding.action,
                "binding does not apply to node"
            );
            return None;
        }
        Some(binding.action)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
