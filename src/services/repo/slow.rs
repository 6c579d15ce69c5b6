//! Slow repository query for testing
//!
//! Decorator around any [`RepoQuery`] that adds configurable delays, so tests
//! can force a reload to still be fetching when the next one starts.

use super::backend::{
    ModuleChain, RefDescriptor, RemoteDescriptor, RepoQuery, SubmoduleInfoResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for slow repository simulation
#[derive(Debug, Clone)]
pub struct SlowRepoConfig {
    /// Delay for branch, remote branch and tag listings
    pub refs_delay: Duration,
    /// Delay for the remote listing
    pub remotes_delay: Duration,
    /// Delay for module chain lookups
    pub modules_delay: Duration,
    /// Delay for submodule scans
    pub submodules_delay: Duration,
}

impl SlowRepoConfig {
    /// Create a config with uniform delay for all operations
    pub fn uniform(delay: Duration) -> Self {
        Self {
            refs_delay: delay,
            remotes_delay: delay,
            modules_delay: delay,
            submodules_delay: delay,
        }
    }

    /// Create a config with no delays
    pub fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }
}

impl Default for SlowRepoConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Call counts for a [`SlowRepoQuery`]
#[derive(Debug, Clone, Default)]
pub struct QueryMetrics {
    pub ref_calls: usize,
    pub remote_calls: usize,
    pub module_calls: usize,
    pub submodule_calls: usize,
    /// Total time spent in artificial delays
    pub total_delay_time: Duration,
}

impl QueryMetrics {
    pub fn total_calls(&self) -> usize {
        self.ref_calls + self.remote_calls + self.module_calls + self.submodule_calls
    }
}

pub struct SlowRepoQuery {
    inner: Arc<dyn RepoQuery>,
    config: Mutex<SlowRepoConfig>,
    metrics: Arc<Mutex<QueryMetrics>>,
}

impl SlowRepoQuery {
    pub fn new(inner: Arc<dyn RepoQuery>, config: SlowRepoConfig) -> Self {
        Self {
            inner,
            config: Mutex::new(config),
            metrics: Arc::new(Mutex::new(QueryMetrics::default())),
        }
    }

    pub fn with_uniform_delay(inner: Arc<dyn RepoQuery>, delay: Duration) -> Self {
        Self::new(inner, SlowRepoConfig::uniform(delay))
    }

    /// Change delays for subsequent calls
    pub async fn set_config(&self, config: SlowRepoConfig) {
        *self.config.lock().await = config;
    }

    /// Get a snapshot of current metrics
    pub async fn metrics(&self) -> QueryMetrics {
        self.metrics.lock().await.clone()
    }

    async fn add_delay(&self, pick: fn(&SlowRepoConfig) -> Duration) {
        let delay = pick(&*self.config.lock().await);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            self.metrics.lock().await.total_delay_time += delay;
        }
    }
}

#[async_trait]
impl RepoQuery for SlowRepoQuery {
    async fn local_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.add_delay(|c| c.refs_delay).await;
        self.metrics.lock().await.ref_calls += 1;
        self.inner.local_branches().await
    }

    async fn tags(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.add_delay(|c| c.refs_delay).await;
        self.metrics.lock().await.ref_calls += 1;
        self.inner.tags().await
    }

    async fn remotes(&self) -> anyhow::Result<Vec<RemoteDescriptor>> {
        self.add_delay(|c| c.remotes_delay).await;
        self.metrics.lock().await.remote_calls += 1;
        self.inner.remotes().await
    }

    async fn remote_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.add_delay(|c| c.refs_delay).await;
        self.metrics.lock().await.ref_calls += 1;
        self.inner.remote_branches().await
    }

    async fn module_chain(&self) -> anyhow::Result<ModuleChain> {
        self.add_delay(|c| c.modules_delay).await;
        self.metrics.lock().await.module_calls += 1;
        self.inner.module_chain().await
    }

    async fn scan_submodules(&self) -> anyhow::Result<SubmoduleInfoResult> {
        self.add_delay(|c| c.submodules_delay).await;
        self.metrics.lock().await.submodule_calls += 1;
        self.inner.scan_submodules().await
    }

    fn is_bare_repository(&self) -> bool {
        self.inner.is_bare_repository()
    }
}
