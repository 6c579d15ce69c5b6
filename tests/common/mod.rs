// Shared fixtures for integration tests

#![allow(dead_code)]

pub mod tracing;

use repotree::config::Config;
use repotree::panel::{PanelOutlines, PanelViews, RepoObjectsTree};
use repotree::services::commands::RecordingCommands;
use repotree::services::repo::{
    MemoryRepo, MemoryRepoQuery, RefDescriptor, RemoteDescriptor, RepoQuery,
};
use repotree::services::status::SubmoduleStatusProvider;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

/// A panel over `query` with outline views and a recording command runner
pub struct PanelHarness {
    pub panel: RepoObjectsTree,
    pub outlines: PanelOutlines,
    pub status: SubmoduleStatusProvider,
    pub commands: Arc<RecordingCommands>,
}

impl PanelHarness {
    pub fn new(query: Arc<dyn RepoQuery>, config: Config) -> Self {
        tracing::init_tracing_from_env();

        let status = SubmoduleStatusProvider::new();
        let commands = Arc::new(RecordingCommands::new());
        let (views, outlines) = PanelViews::outlines();
        let panel = RepoObjectsTree::new(
            query,
            status.clone(),
            config,
            views,
            commands.clone(),
            Handle::current(),
        );

        Self {
            panel,
            outlines,
            status,
            commands,
        }
    }

    pub async fn settle(&mut self) {
        within(self.panel.settle()).await;
    }

    pub async fn run_until(&mut self, done: impl FnMut(&RepoObjectsTree) -> bool) {
        within(self.panel.run_until(done)).await;
    }
}

/// Await `future`, failing the test if it takes longer than [`WAIT`]
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .expect("timed out")
}

/// A small repository: two branches, a tag and one remote
pub fn sample_repo() -> MemoryRepo {
    MemoryRepo {
        branches: vec![
            RefDescriptor::new("refs/heads/main", "1").current(),
            RefDescriptor::new("refs/heads/feature/login", "2"),
        ],
        tags: vec![RefDescriptor::new("refs/tags/v1.0", "3")],
        remotes: vec![RemoteDescriptor {
            name: "origin".into(),
            enabled: true,
        }],
        remote_branches: vec![RefDescriptor::new("refs/remotes/origin/main", "1")],
        ..MemoryRepo::default()
    }
}

pub fn memory_query(repo: MemoryRepo) -> Arc<MemoryRepoQuery> {
    Arc::new(MemoryRepoQuery::new(repo))
}
