//! One category of repository objects bound to one view subtree
//!
//! A [`Tree`] owns its nodes and implements the reload protocol:
//!
//! ```text
//!   reload() -> Fetching --(data ready, still current)--> Applying -> Idle
//!                  |                                                  |
//!                  +-- superseded or cancelled: result dropped        +-- detail loads
//! ```
//!
//! Fetching runs on the tokio runtime. Its result comes back as a
//! [`PanelEvent`] that the owner of the tree feeds into
//! [`Tree::handle_event`] on its own thread, which is the only place nodes
//! and view are mutated. Every reload gets a child of the tree's lifetime
//! token; starting a new reload cancels the previous one first, so only the
//! newest result is ever applied.

use super::node::{NodeId, NodeKind, NodeVariant, SubmoduleNode};
use super::nodes::Nodes;
use crate::error::TreeError;
use crate::services::commands::{CommandOutcome, CommandRunner, RepoCommand};
use crate::services::repo::{DetailedSubmoduleInfo, SubmoduleInfoResult};
use crate::services::status::SubmoduleStatusProvider;
use crate::view::decorations::node_style;
use crate::view::sink::{TreeView, ViewRow};
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeCategory {
    Branches,
    Remotes,
    Tags,
    Submodules,
}

impl TreeCategory {
    pub const ALL: [TreeCategory; 4] = [
        TreeCategory::Branches,
        TreeCategory::Remotes,
        TreeCategory::Tags,
        TreeCategory::Submodules,
    ];

    pub fn title(self) -> &'static str {
        match self {
            TreeCategory::Branches => "Branches",
            TreeCategory::Remotes => "Remotes",
            TreeCategory::Tags => "Tags",
            TreeCategory::Submodules => "Submodules",
        }
    }

    /// Header text after a fill
    pub fn header(self, root_count: usize) -> String {
        match self {
            TreeCategory::Tags => format!("{} ({root_count})", self.title()),
            _ => self.title().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Idle,
    Fetching,
    Applying,
}

/// What handling an event did to the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A fetched result replaced the nodes
    Applied { nodes: usize },
    /// The fetch failed; the tree now shows nothing
    Failed(String),
    /// The event belonged to a superseded reload and was dropped
    Discarded,
    /// Every detail load of the current reload has finished
    DetailsLoaded,
}

/// Expansion applied the first time a tree is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstFill {
    /// Expand the header and every node
    ExpandAll,
    /// Expand the header only
    Expand,
    Collapse,
    Keep,
}

/// Results coming back from work running off the owning thread
#[derive(Debug)]
pub enum TreeEvent {
    Fetched {
        generation: u64,
        result: anyhow::Result<Nodes>,
    },
    DetailLoaded {
        generation: u64,
        node: NodeId,
        details: DetailedSubmoduleInfo,
    },
    DetailsFinished {
        generation: u64,
    },
}

#[derive(Debug)]
pub enum PanelEvent {
    Tree {
        category: TreeCategory,
        event: TreeEvent,
    },
    /// A new submodule snapshot arrived from the status provider
    StatusUpdated(Arc<SubmoduleInfoResult>),
}

pub type EventSender = mpsc::UnboundedSender<PanelEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PanelEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Collaborators shared by every tree of one panel
#[derive(Clone)]
pub struct TreeContext {
    pub events: EventSender,
    pub commands: Arc<dyn CommandRunner>,
    pub runtime: Handle,
}

#[derive(Debug)]
struct ActiveReload {
    generation: u64,
    token: CancellationToken,
}

pub struct Tree {
    category: TreeCategory,
    nodes: Nodes,
    view: Box<dyn TreeView>,
    state: ReloadState,
    active: Option<ActiveReload>,
    generation: u64,
    /// Parent of every reload and subscription token
    lifetime: CancellationToken,
    context: TreeContext,
    /// Set while the view is rebuilt, so re-fired selection events are dropped
    ignore_selection_changed: bool,
    filled_once: bool,
    first_fill: FirstFill,
    last_error: Option<String>,
    details_pending: bool,
    status_subscription: Option<CancellationToken>,
}

impl Tree {
    pub fn new(
        category: TreeCategory,
        view: Box<dyn TreeView>,
        context: TreeContext,
        first_fill: FirstFill,
    ) -> Self {
        Self {
            category,
            nodes: Nodes::new(),
            view,
            state: ReloadState::Idle,
            active: None,
            generation: 0,
            lifetime: CancellationToken::new(),
            context,
            ignore_selection_changed: false,
            filled_once: false,
            first_fill,
            last_error: None,
            details_pending: false,
            status_subscription: None,
        }
    }

    pub fn category(&self) -> TreeCategory {
        self.category
    }

    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// Generation of the most recent reload
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Idle with no detail load outstanding
    pub fn is_settled(&self) -> bool {
        self.state == ReloadState::Idle && !self.details_pending
    }

    pub fn has_filled(&self) -> bool {
        self.filled_once
    }

    pub fn details_pending(&self) -> bool {
        self.details_pending
    }

    /// Message of the last failed fetch, cleared by the next successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Cancellation token of the current reload
    pub fn current_token(&self) -> Option<CancellationToken> {
        self.active.as_ref().map(|a| a.token.clone())
    }

    pub fn ignores_selection(&self) -> bool {
        self.ignore_selection_changed
    }

    /// Start a reload, superseding any reload still in flight
    ///
    /// `fetch` receives the reload's cancellation token and builds the
    /// future producing the new nodes; it runs on the runtime, never on the
    /// calling thread. Returns the reload's generation.
    pub fn reload<F, Fut>(&mut self, fetch: F) -> u64
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<Nodes>> + Send + 'static,
    {
        if let Some(previous) = self.active.take() {
            previous.token.cancel();
            tracing::debug!(
                category = ?self.category,
                generation = previous.generation,
                "superseded reload"
            );
        }

        self.generation += 1;
        let generation = self.generation;
        let token = self.lifetime.child_token();
        self.active = Some(ActiveReload {
            generation,
            token: token.clone(),
        });
        self.state = ReloadState::Fetching;
        self.details_pending = false;
        tracing::debug!(category = ?self.category, generation, "fetching");

        let fetching = fetch(token.clone());
        let events = self.context.events.clone();
        let category = self.category;

        self.context.runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!(?category, generation, "fetch cancelled");
                    return;
                }
                result = fetching => result,
            };

            if token.is_cancelled() {
                tracing::trace!(?category, generation, "fetch finished after cancellation");
                return;
            }

            let event = TreeEvent::Fetched { generation, result };
            if events.send(PanelEvent::Tree { category, event }).is_err() {
                tracing::trace!(?category, generation, "panel gone, dropping fetch result");
            }
        });

        generation
    }

    /// Cancel the reload in flight, if any, and go back to idle
    pub fn cancel_reload(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            tracing::debug!(category = ?self.category, generation = active.generation, "reload cancelled");
        }
        self.state = ReloadState::Idle;
        self.details_pending = false;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.generation == generation && !a.token.is_cancelled())
    }

    /// Apply a result coming back from the runtime
    pub fn handle_event(&mut self, event: TreeEvent) -> Option<ReloadOutcome> {
        match event {
            TreeEvent::Fetched { generation, result } => {
                if !self.is_current(generation) {
                    tracing::debug!(category = ?self.category, generation, "discarding stale fetch result");
                    return Some(ReloadOutcome::Discarded);
                }
                Some(self.apply(generation, result))
            }
            TreeEvent::DetailLoaded {
                generation,
                node,
                details,
            } => {
                if !self.is_current(generation) {
                    tracing::trace!(category = ?self.category, generation, %node, "discarding stale details");
                    return None;
                }
                if let Some(submodule) = self
                    .nodes
                    .get_mut(node)
                    .and_then(|n| SubmoduleNode::from_kind_mut(&mut n.kind))
                {
                    submodule.details = Some(details);
                }
                if let Err(e) = self.apply_style(node) {
                    tracing::error!(category = ?self.category, "applying details failed: {e}");
                }
                None
            }
            TreeEvent::DetailsFinished { generation } => {
                if !self.is_current(generation) {
                    return None;
                }
                self.details_pending = false;
                tracing::debug!(category = ?self.category, generation, "details loaded");
                Some(ReloadOutcome::DetailsLoaded)
            }
        }
    }

    fn apply(&mut self, generation: u64, result: anyhow::Result<Nodes>) -> ReloadOutcome {
        self.state = ReloadState::Applying;

        let (nodes, outcome) = match result {
            Ok(nodes) => {
                self.last_error = None;
                let count = nodes.len();
                (nodes, ReloadOutcome::Applied { nodes: count })
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::error!(category = ?self.category, generation, "reload failed: {message}");
                self.last_error = Some(message.clone());
                (Nodes::new(), ReloadOutcome::Failed(message))
            }
        };

        self.ignore_selection_changed = true;
        self.nodes = nodes;
        let rows = self.rows();
        if let Some(reselected) = self.view.rebuild(rows) {
            self.on_selected(reselected);
        }
        self.ignore_selection_changed = false;

        let first_time = !self.filled_once;
        self.filled_once = true;
        self.post_fill(first_time);

        self.state = ReloadState::Idle;
        tracing::debug!(category = ?self.category, generation, ?outcome, "applied");

        if let Some(token) = self.current_token() {
            self.start_detail_loads(generation, token);
        }

        outcome
    }

    fn post_fill(&mut self, first_time: bool) {
        if first_time {
            match self.first_fill {
                FirstFill::ExpandAll => self.view.expand_all(),
                FirstFill::Expand => self.view.set_expanded(true),
                FirstFill::Collapse => self.view.set_expanded(false),
                FirstFill::Keep => {}
            }
        }
        let header = self.category.header(self.nodes.root_count());
        self.view.set_header(&header);
    }

    fn rows(&self) -> Vec<ViewRow> {
        let mut depths: HashMap<NodeId, usize> = HashMap::new();
        self.nodes
            .depth_first()
            .map(|node| {
                let depth = node
                    .parent
                    .and_then(|p| depths.get(&p))
                    .map_or(0, |d| d + 1);
                depths.insert(node.id, depth);

                ViewRow {
                    node: node.id,
                    key: node.key(),
                    parent: node.parent,
                    depth,
                    text: node.display_text(),
                    style: node_style(&node.kind),
                    has_children: node.has_children(),
                }
            })
            .collect()
    }

    /// Load extended status for every submodule node in parallel
    fn start_detail_loads(&mut self, generation: u64, token: CancellationToken) {
        let loads: Vec<_> = self
            .nodes
            .depth_enumerate::<SubmoduleNode>()
            .filter_map(|(id, node)| node.info.detailed.clone().map(|handle| (id, handle)))
            .collect();
        if loads.is_empty() {
            return;
        }

        self.details_pending = true;
        let events = self.context.events.clone();
        let category = self.category;
        tracing::debug!(?category, generation, count = loads.len(), "loading details");

        self.context.runtime.spawn(async move {
            let tasks = loads.into_iter().map(|(node, handle)| {
                let token = token.clone();
                let events = events.clone();
                async move {
                    let details = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        details = handle.get() => details,
                    };
                    if token.is_cancelled() {
                        return;
                    }
                    if let Some(details) = details {
                        let event = TreeEvent::DetailLoaded {
                            generation,
                            node,
                            details,
                        };
                        let _ = events.send(PanelEvent::Tree { category, event });
                    }
                }
            });
            join_all(tasks).await;

            if token.is_cancelled() {
                tracing::trace!(?category, generation, "detail loads cancelled");
                return;
            }
            let event = TreeEvent::DetailsFinished { generation };
            let _ = events.send(PanelEvent::Tree { category, event });
        });
    }

    /// Push one node's current text and style into the view
    pub fn apply_style(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.nodes.get(id).ok_or(TreeError::NodeNotFound(id))?;
        let text = node.display_text();
        let style = node_style(&node.kind);
        if self.view.apply_style(id, &text, &style) {
            Ok(())
        } else {
            Err(TreeError::NotAttached(id))
        }
    }

    /// Selection hook; branches, tags and remote branches select their
    /// revision
    pub fn on_selected(&mut self, id: NodeId) -> Option<CommandOutcome> {
        if self.ignore_selection_changed {
            tracing::trace!(category = ?self.category, %id, "ignoring selection during rebuild");
            return None;
        }

        let command = match &self.nodes.get(id)?.kind {
            NodeKind::LocalBranch(b) => RepoCommand::SelectRevision {
                object_id: b.object_id.clone(),
            },
            NodeKind::RemoteBranch(b) => RepoCommand::SelectRevision {
                object_id: b.object_id.clone(),
            },
            NodeKind::Tag(t) => RepoCommand::SelectRevision {
                object_id: t.object_id.clone(),
            },
            _ => return None,
        };
        Some(self.context.commands.run(command))
    }

    /// Double-click hook: checkout a branch, branch off a tag, open a
    /// submodule
    pub fn on_double_click(&mut self, id: NodeId) -> Option<CommandOutcome> {
        if self.ignore_selection_changed {
            return None;
        }

        let command = match &self.nodes.get(id)?.kind {
            NodeKind::LocalBranch(b) if !b.is_active => RepoCommand::CheckoutBranch {
                name: b.full_path.clone(),
            },
            NodeKind::Tag(t) => RepoCommand::CreateBranch {
                start_point: t.full_path.clone(),
            },
            NodeKind::Submodule(s) if s.can_open() => RepoCommand::OpenRepository {
                path: s.info.path.clone(),
            },
            _ => return None,
        };
        Some(self.context.commands.run(command))
    }

    pub fn run_command(&self, command: RepoCommand) -> CommandOutcome {
        self.context.commands.run(command)
    }

    pub fn expand_all(&mut self) {
        self.view.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.view.collapse_all();
    }

    /// Forward snapshots from `provider` until unsubscribed or dropped
    pub fn subscribe_status(&mut self, provider: &SubmoduleStatusProvider) {
        self.unsubscribe_status();

        let token = self.lifetime.child_token();
        let mut subscription = provider.subscribe();
        let events = self.context.events.clone();
        let category = self.category;
        let guard = token.clone();

        self.context.runtime.spawn(async move {
            tracing::debug!(?category, "status subscription started");
            loop {
                tokio::select! {
                    biased;
                    _ = guard.cancelled() => break,
                    snapshot = subscription.next() => match snapshot {
                        Some(snapshot) => {
                            if events.send(PanelEvent::StatusUpdated(snapshot)).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(?category, "status subscription stopped");
        });

        self.status_subscription = Some(token);
    }

    pub fn unsubscribe_status(&mut self) {
        if let Some(token) = self.status_subscription.take() {
            token.cancel();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.status_subscription
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        self.lifetime.cancel();
        tracing::trace!(category = ?self.category, "tree dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::commands::RecordingCommands;
    use crate::services::repo::{DetailHandle, SubmoduleInfo, SubmoduleStatus};
    use crate::view::outline::OutlineView;
    use crate::view::tree::node::{LocalBranchNode, SubmoduleLabel, TagNode};
    use std::time::Duration;

    struct Harness {
        tree: Tree,
        view: OutlineView,
        events: EventReceiver,
        commands: Arc<RecordingCommands>,
    }

    impl Harness {
        fn new(category: TreeCategory, first_fill: FirstFill) -> Self {
            let (sender, events) = event_channel();
            let commands = Arc::new(RecordingCommands::new());
            let view = OutlineView::new();
            let context = TreeContext {
                events: sender,
                commands: commands.clone(),
                runtime: Handle::current(),
            };
            let tree = Tree::new(category, Box::new(view.clone()), context, first_fill);
            Self {
                tree,
                view,
                events,
                commands,
            }
        }

        /// Feed events to the tree until one produces an outcome
        async fn next_outcome(&mut self) -> ReloadOutcome {
            loop {
                let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                    .await
                    .expect("timed out waiting for a tree event")
                    .expect("channel closed");
                if let PanelEvent::Tree { event, .. } = event {
                    if let Some(outcome) = self.tree.handle_event(event) {
                        return outcome;
                    }
                }
            }
        }
    }

    fn tags(names: &[&str]) -> Nodes {
        let mut nodes = Nodes::new();
        for name in names {
            nodes
                .add_node(
                    None,
                    NodeKind::Tag(TagNode {
                        full_path: name.to_string(),
                        object_id: format!("oid-{name}"),
                    }),
                )
                .unwrap();
        }
        nodes
    }

    fn submodules(handles: Vec<(&str, DetailHandle)>) -> Nodes {
        let mut nodes = Nodes::new();
        for (path, handle) in handles {
            let info = SubmoduleInfo::new(format!("/r/{path}/"), path, false).with_details(handle);
            nodes
                .add_node(
                    None,
                    NodeKind::Submodule(SubmoduleNode {
                        info,
                        is_current: false,
                        local_path: path.to_string(),
                        super_path: "/r/".to_string(),
                        relative_path: path.to_string(),
                        label: SubmoduleLabel::Name,
                        details: None,
                    }),
                )
                .unwrap();
        }
        nodes
    }

    #[tokio::test]
    async fn test_reload_applies_and_sets_header() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Collapse);
        h.tree.reload(|_| async { Ok(tags(&["v1", "v2"])) });
        assert_eq!(h.tree.state(), ReloadState::Fetching);

        assert_eq!(h.next_outcome().await, ReloadOutcome::Applied { nodes: 2 });
        assert_eq!(h.tree.state(), ReloadState::Idle);
        assert!(h.tree.is_settled());
        assert_eq!(h.view.state().header(), "Tags (2)");
        assert!(!h.view.state().is_header_expanded());
        assert_eq!(h.view.state().rows().len(), 2);
    }

    #[tokio::test]
    async fn test_second_reload_supersedes_first() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Expand);

        let (release_first, first_gate) = tokio::sync::oneshot::channel::<()>();
        h.tree.reload(|_| async move {
            let _ = first_gate.await;
            Ok(tags(&["stale"]))
        });
        let first_token = h.tree.current_token().unwrap();

        h.tree.reload(|_| async { Ok(tags(&["fresh"])) });
        assert!(first_token.is_cancelled());
        let _ = release_first.send(());

        assert_eq!(h.next_outcome().await, ReloadOutcome::Applied { nodes: 1 });
        let texts: Vec<_> = h.view.state().rows().iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["fresh"]);
        assert_eq!(h.view.state().rebuilds(), 1);
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Keep);
        let stale = h.tree.reload(|_| async { Ok(tags(&["a"])) });
        h.tree.reload(|_| async { Ok(tags(&["b"])) });

        let outcome = h.tree.handle_event(TreeEvent::Fetched {
            generation: stale,
            result: Ok(tags(&["a"])),
        });
        assert_eq!(outcome, Some(ReloadOutcome::Discarded));
        assert_eq!(h.view.state().rebuilds(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_empty_tree() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Keep);
        h.tree.reload(|_| async { Ok(tags(&["v1"])) });
        h.next_outcome().await;

        h.tree
            .reload(|_| async { Err(anyhow::anyhow!("packed-refs unreadable")) });
        let outcome = h.next_outcome().await;

        assert_eq!(outcome, ReloadOutcome::Failed("packed-refs unreadable".into()));
        assert!(h.tree.nodes().is_empty());
        assert_eq!(h.tree.last_error(), Some("packed-refs unreadable"));
        assert_eq!(h.view.state().header(), "Tags (0)");
        assert_eq!(h.tree.state(), ReloadState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_reload_returns_to_idle() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Keep);
        h.tree.reload(|token| async move {
            token.cancelled().await;
            Ok(tags(&["never"]))
        });
        let token = h.tree.current_token().unwrap();

        h.tree.cancel_reload();
        assert!(token.is_cancelled());
        assert_eq!(h.tree.state(), ReloadState::Idle);

        let nothing = tokio::time::timeout(Duration::from_millis(50), h.events.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_details_apply_style() {
        let mut h = Harness::new(TreeCategory::Submodules, FirstFill::ExpandAll);
        let details = DetailedSubmoduleInfo {
            status: Some(SubmoduleStatus::FastForward),
            is_dirty: false,
        };
        h.tree.reload(move |_| async move {
            Ok(submodules(vec![
                ("a", DetailHandle::ready(details)),
                ("b", DetailHandle::ready(details)),
            ]))
        });

        assert_eq!(h.next_outcome().await, ReloadOutcome::Applied { nodes: 2 });
        assert!(h.tree.details_pending());
        assert_eq!(h.next_outcome().await, ReloadOutcome::DetailsLoaded);
        assert!(h.tree.is_settled());
        assert_eq!(h.view.state().style_updates(), 2);

        let images: Vec<_> = h.view.state().rows().iter().map(|r| r.style.image).collect();
        assert!(images
            .iter()
            .all(|i| *i == crate::view::decorations::ImageKey::SubmoduleRevisionUp));
    }

    #[tokio::test]
    async fn test_cancellation_reaches_detail_loads() {
        let mut h = Harness::new(TreeCategory::Submodules, FirstFill::Keep);
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let slow = DetailHandle::new(async move {
            let _ = gate.await;
            Some(DetailedSubmoduleInfo::default())
        });

        h.tree.reload(move |_| async move { Ok(submodules(vec![("a", slow)])) });
        h.next_outcome().await;
        let token = h.tree.current_token().unwrap();
        assert!(h.tree.details_pending());

        h.tree.reload(|_| async { Ok(Nodes::new()) });
        assert!(token.is_cancelled());
        let _ = release.send(());

        assert_eq!(h.next_outcome().await, ReloadOutcome::Applied { nodes: 0 });
        // No stale detail event may follow
        let nothing = tokio::time::timeout(Duration::from_millis(50), h.events.recv()).await;
        assert!(nothing.is_err());
        assert_eq!(h.view.state().style_updates(), 0);
    }

    #[tokio::test]
    async fn test_selection_ignored_during_rebuild() {
        let mut h = Harness::new(TreeCategory::Branches, FirstFill::ExpandAll);
        let branch = || {
            let mut nodes = Nodes::new();
            nodes
                .add_node(
                    None,
                    NodeKind::LocalBranch(LocalBranchNode {
                        full_path: "main".into(),
                        object_id: "abc".into(),
                        is_active: false,
                    }),
                )
                .unwrap();
            nodes
        };

        h.tree.reload(move |_| async move { Ok(branch()) });
        h.next_outcome().await;
        let key = h.tree.nodes().depth_first().next().unwrap().key();
        let id = h.view.select(&key).unwrap();

        assert_eq!(h.tree.on_selected(id), Some(CommandOutcome::Succeeded));
        assert_eq!(h.commands.commands().len(), 1);

        // The view re-selects the branch after the rebuild; that must not
        // reach the command runner
        h.tree.reload(move |_| async move { Ok(branch()) });
        h.next_outcome().await;
        assert_eq!(h.commands.commands().len(), 1);
        assert!(!h.tree.ignores_selection());
    }

    #[tokio::test]
    async fn test_double_click() {
        let mut h = Harness::new(TreeCategory::Tags, FirstFill::Keep);
        h.tree.reload(|_| async { Ok(tags(&["v1"])) });
        h.next_outcome().await;

        let id = h.tree.nodes().roots().ids()[0];
        h.tree.on_double_click(id);
        assert_eq!(
            h.commands.commands(),
            vec![RepoCommand::CreateBranch {
                start_point: "v1".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_status_subscription_tied_to_tree() {
        let mut h = Harness::new(TreeCategory::Submodules, FirstFill::Keep);
        let provider = SubmoduleStatusProvider::new();
        h.tree.subscribe_status(&provider);
        assert!(h.tree.is_subscribed());

        provider.publish(SubmoduleInfoResult::default());
        let event = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, PanelEvent::StatusUpdated(_)));

        drop(h.tree);
        for _ in 0..100 {
            if provider.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(provider.subscriber_count(), 0);
    }
}
