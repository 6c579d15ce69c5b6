//! The repository objects panel
//!
//! [`RepoObjectsTree`] owns one [`Tree`] per category, the event channel
//! their background work reports through and the context-menu state. Its
//! owner is the interaction thread: it forwards repository notifications
//! and clicks in, and pumps events so results get applied.

pub mod branches;
pub mod remotes;
pub mod submodules;
pub mod tags;

use crate::config::Config;
use crate::services::commands::{CommandOutcome, CommandRunner, RepoCommand};
use crate::services::repo::{RepoQuery, SubmoduleInfo};
use crate::services::status::SubmoduleStatusProvider;
use crate::view::outline::OutlineView;
use crate::view::sink::TreeView;
use crate::view::tree::actions::{available_actions, command_for, tree_actions};
use crate::view::tree::{
    event_channel, ActionContext, ActionRegistry, BindingId, EventReceiver, NodeAction, NodeId,
    PanelEvent, ReloadOutcome, Tree, TreeAction, TreeCategory, TreeContext,
};
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// View subtrees the panel renders into, one per category
pub struct PanelViews {
    pub branches: Box<dyn TreeView>,
    pub remotes: Box<dyn TreeView>,
    pub tags: Box<dyn TreeView>,
    pub submodules: Box<dyn TreeView>,
}

/// Handles to the outline views created by [`PanelViews::outlines`]
#[derive(Debug, Clone, Default)]
pub struct PanelOutlines {
    pub branches: OutlineView,
    pub remotes: OutlineView,
    pub tags: OutlineView,
    pub submodules: OutlineView,
}

impl PanelOutlines {
    pub fn get(&self, category: TreeCategory) -> &OutlineView {
        match category {
            TreeCategory::Branches => &self.branches,
            TreeCategory::Remotes => &self.remotes,
            TreeCategory::Tags => &self.tags,
            TreeCategory::Submodules => &self.submodules,
        }
    }

    /// Every tree rendered in panel order
    pub fn render(&self) -> String {
        TreeCategory::ALL
            .iter()
            .map(|&category| self.get(category).render())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PanelViews {
    /// Outline views for every category, plus handles to inspect them
    pub fn outlines() -> (Self, PanelOutlines) {
        let outlines = PanelOutlines::default();
        let views = Self {
            branches: Box::new(outlines.branches.clone()),
            remotes: Box::new(outlines.remotes.clone()),
            tags: Box::new(outlines.tags.clone()),
            submodules: Box::new(outlines.submodules.clone()),
        };
        (views, outlines)
    }
}

pub struct RepoObjectsTree {
    query: Arc<dyn RepoQuery>,
    status: SubmoduleStatusProvider,
    config: Config,
    branches: Tree,
    remotes: Tree,
    tags: Tree,
    submodules: Tree,
    events: EventReceiver,
    registry: ActionRegistry,
    commands: Arc<dyn CommandRunner>,
    last_right_clicked: Option<(TreeCategory, NodeId)>,
    top_project: Option<SubmoduleInfo>,
    super_project: Option<SubmoduleInfo>,
}

impl RepoObjectsTree {
    pub fn new(
        query: Arc<dyn RepoQuery>,
        status: SubmoduleStatusProvider,
        config: Config,
        views: PanelViews,
        commands: Arc<dyn CommandRunner>,
        runtime: Handle,
    ) -> Self {
        let (sender, events) = event_channel();
        let context = TreeContext {
            events: sender,
            commands: commands.clone(),
            runtime,
        };

        let branches = Tree::new(
            TreeCategory::Branches,
            views.branches,
            context.clone(),
            config.branches.first_fill(),
        );
        let remotes = Tree::new(
            TreeCategory::Remotes,
            views.remotes,
            context.clone(),
            config.remotes.first_fill(),
        );
        let tags = Tree::new(
            TreeCategory::Tags,
            views.tags,
            context.clone(),
            config.tags.first_fill(),
        );
        let mut submodules = Tree::new(
            TreeCategory::Submodules,
            views.submodules,
            context,
            config.submodules.first_fill(),
        );
        submodules.subscribe_status(&status);

        Self {
            query,
            status,
            config,
            branches,
            remotes,
            tags,
            submodules,
            events,
            registry: ActionRegistry::with_defaults(),
            commands,
            last_right_clicked: None,
            top_project: None,
            super_project: None,
        }
    }

    pub fn tree(&self, category: TreeCategory) -> &Tree {
        match category {
            TreeCategory::Branches => &self.branches,
            TreeCategory::Remotes => &self.remotes,
            TreeCategory::Tags => &self.tags,
            TreeCategory::Submodules => &self.submodules,
        }
    }

    fn tree_mut(&mut self, category: TreeCategory) -> &mut Tree {
        match category {
            TreeCategory::Branches => &mut self.branches,
            TreeCategory::Remotes => &mut self.remotes,
            TreeCategory::Tags => &mut self.tags,
            TreeCategory::Submodules => &mut self.submodules,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Text of the top project from the last submodule snapshot
    pub fn top_project_name(&self) -> Option<&str> {
        self.top_project.as_ref().map(|info| info.text.as_str())
    }

    pub fn super_project_name(&self) -> Option<&str> {
        self.super_project.as_ref().map(|info| info.text.as_str())
    }

    /// Refresh every tree after the repository changed
    pub fn on_repository_changed(&mut self) {
        tracing::debug!("repository changed, refreshing all trees");
        for category in TreeCategory::ALL {
            self.refresh(category);
        }
    }

    /// Start a reload of one tree
    ///
    /// The submodule tree is push-driven; refreshing it asks the status
    /// provider to send its last snapshot again.
    pub fn refresh(&mut self, category: TreeCategory) {
        let query = self.query.clone();
        match category {
            TreeCategory::Branches => {
                self.branches
                    .reload(move |token| branches::load(query, token));
            }
            TreeCategory::Remotes => {
                self.remotes.reload(move |token| remotes::load(query, token));
            }
            TreeCategory::Tags => {
                self.tags.reload(move |token| tags::load(query, token));
            }
            TreeCategory::Submodules => {
                if !self.status.resend_cached() {
                    tracing::debug!("no submodule status yet, waiting for the provider");
                }
            }
        }
    }

    /// Apply one event; returns what it did to which tree
    pub fn handle(&mut self, event: PanelEvent) -> Option<(TreeCategory, ReloadOutcome)> {
        match event {
            PanelEvent::Tree { category, event } => {
                let outcome = self.tree_mut(category).handle_event(event)?;
                if self
                    .last_right_clicked
                    .is_some_and(|(clicked, _)| clicked == category)
                    && matches!(outcome, ReloadOutcome::Applied { .. } | ReloadOutcome::Failed(_))
                {
                    // The clicked node went away with the rebuild
                    self.last_right_clicked = None;
                }
                Some((category, outcome))
            }
            PanelEvent::StatusUpdated(snapshot) => {
                self.top_project = snapshot.top_project.clone();
                self.super_project = snapshot.super_project.clone();

                let query = self.query.clone();
                let settings = self.config.submodules.clone();
                self.submodules
                    .reload(move |token| submodules::load(query, snapshot, settings, token));
                None
            }
        }
    }

    /// Apply every event already queued, without waiting
    pub fn pump(&mut self) -> Vec<(TreeCategory, ReloadOutcome)> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            outcomes.extend(self.handle(event));
        }
        outcomes
    }

    /// Wait for the next event that changes a tree and apply it
    pub async fn next_outcome(&mut self) -> Option<(TreeCategory, ReloadOutcome)> {
        loop {
            let event = self.events.recv().await?;
            if let Some(outcome) = self.handle(event) {
                return Some(outcome);
            }
        }
    }

    /// Apply events until `done` holds
    pub async fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool) {
        self.pump();
        while !done(self) {
            let Some(event) = self.events.recv().await else {
                return;
            };
            self.handle(event);
        }
    }

    /// No tree is reloading or loading details
    pub fn is_settled(&self) -> bool {
        TreeCategory::ALL
            .iter()
            .all(|&category| self.tree(category).is_settled())
    }

    /// Apply events until every tree is settled
    pub async fn settle(&mut self) {
        self.run_until(Self::is_settled).await;
    }

    pub fn on_node_click(&mut self, category: TreeCategory, id: NodeId, button: MouseButton) {
        match button {
            MouseButton::Right => {
                self.last_right_clicked = Some((category, id));
            }
            MouseButton::Left => {
                self.last_right_clicked = None;
                self.tree_mut(category).on_selected(id);
            }
        }
    }

    pub fn on_node_double_click(
        &mut self,
        category: TreeCategory,
        id: NodeId,
    ) -> Option<CommandOutcome> {
        self.tree_mut(category).on_double_click(id)
    }

    fn action_context(&self) -> ActionContext {
        ActionContext {
            bare_repository: self.query.is_bare_repository(),
        }
    }

    /// Menu entries for the last right-clicked node
    pub fn context_actions(&self) -> Vec<(BindingId, NodeAction)> {
        let Some((category, id)) = self.last_right_clicked else {
            return Vec::new();
        };
        let nodes = self.tree(category).nodes();
        let Some(node) = nodes.get(id) else {
            return Vec::new();
        };

        available_actions(node, self.action_context())
            .into_iter()
            .filter(|&action| command_for(action, id, nodes).is_some())
            .filter_map(|action| {
                self.registry
                    .find(node.variant(), action)
                    .map(|binding| (binding, action))
            })
            .collect()
    }

    /// Fire a menu binding against the last right-clicked node
    ///
    /// Does nothing when nothing was right-clicked or the node is of another
    /// variant than the binding.
    pub fn invoke(&self, binding: BindingId) -> Option<CommandOutcome> {
        let (category, id) = self.last_right_clicked?;
        let tree = self.tree(category);
        let node = tree.nodes().get(id)?;
        let action = self.registry.resolve(binding, node)?;
        let command = command_for(action, id, tree.nodes())?;
        tracing::debug!(?category, %id, ?action, "invoking context action");
        Some(tree.run_command(command))
    }

    /// Tree-level actions offered on the root of `category`
    pub fn available_tree_actions(&self, category: TreeCategory) -> Vec<TreeAction> {
        tree_actions(category)
            .iter()
            .copied()
            .filter(|&action| self.is_tree_action_available(action))
            .collect()
    }

    fn is_tree_action_available(&self, action: TreeAction) -> bool {
        match action {
            TreeAction::OpenTopProject => self.top_project.as_ref().is_some_and(|p| !p.bold),
            TreeAction::OpenSuperProject => self.super_project.as_ref().is_some_and(|p| !p.bold),
            TreeAction::ManageSubmodules | TreeAction::SynchronizeSubmodules => {
                !self.query.is_bare_repository()
            }
            _ => true,
        }
    }

    pub fn invoke_tree_action(
        &mut self,
        category: TreeCategory,
        action: TreeAction,
    ) -> Option<CommandOutcome> {
        if !tree_actions(category).contains(&action) || !self.is_tree_action_available(action) {
            tracing::trace!(?category, ?action, "tree action not offered here");
            return None;
        }

        let command = match action {
            TreeAction::CollapseAll => {
                self.tree_mut(category).collapse_all();
                return None;
            }
            TreeAction::ExpandAll => {
                self.tree_mut(category).expand_all();
                return None;
            }
            TreeAction::ManageRemotes => RepoCommand::ManageRemotes,
            TreeAction::UpdateAllSubmodules => RepoCommand::UpdateAllSubmodules,
            TreeAction::OpenTopProject => RepoCommand::OpenRepository {
                path: self.top_project.as_ref()?.path.clone(),
            },
            TreeAction::OpenSuperProject => RepoCommand::OpenRepository {
                path: self.super_project.as_ref()?.path.clone(),
            },
            TreeAction::ManageSubmodules => RepoCommand::ManageSubmodules,
            TreeAction::SynchronizeSubmodules => RepoCommand::SynchronizeSubmodules,
        };
        Some(self.commands.run(command))
    }
}
