//! In-memory repository, for tests and demos

use super::backend::{
    ModuleChain, RefDescriptor, RemoteDescriptor, RepoQuery, SubmoduleInfoResult,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Repository contents held in memory
///
/// Every field can be replaced between reloads through [`MemoryRepoQuery::update`].
#[derive(Debug, Clone)]
pub struct MemoryRepo {
    pub branches: Vec<RefDescriptor>,
    pub tags: Vec<RefDescriptor>,
    pub remotes: Vec<RemoteDescriptor>,
    pub remote_branches: Vec<RefDescriptor>,
    pub modules: Vec<String>,
    pub submodules: SubmoduleInfoResult,
    pub bare: bool,
    /// When set, every query fails with this message
    pub failure: Option<String>,
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self {
            branches: Vec::new(),
            tags: Vec::new(),
            remotes: Vec::new(),
            remote_branches: Vec::new(),
            modules: vec!["/repo/".to_string()],
            submodules: SubmoduleInfoResult::default(),
            bare: false,
            failure: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepoQuery {
    repo: Mutex<MemoryRepo>,
}

impl MemoryRepoQuery {
    pub fn new(repo: MemoryRepo) -> Self {
        Self {
            repo: Mutex::new(repo),
        }
    }

    /// Mutate the stored repository
    pub fn update(&self, f: impl FnOnce(&mut MemoryRepo)) {
        let mut repo = self.repo.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut repo);
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryRepo) -> T) -> anyhow::Result<T> {
        let repo = self.repo.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(message) = &repo.failure {
            anyhow::bail!("{message}");
        }
        Ok(f(&repo))
    }
}

#[async_trait]
impl RepoQuery for MemoryRepoQuery {
    async fn local_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.read(|r| r.branches.clone())
    }

    async fn tags(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.read(|r| r.tags.clone())
    }

    async fn remotes(&self) -> anyhow::Result<Vec<RemoteDescriptor>> {
        self.read(|r| r.remotes.clone())
    }

    async fn remote_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.read(|r| r.remote_branches.clone())
    }

    async fn module_chain(&self) -> anyhow::Result<ModuleChain> {
        let modules = self.read(|r| r.modules.clone())?;
        ModuleChain::new(modules).ok_or_else(|| anyhow::anyhow!("repository has no working directory"))
    }

    async fn scan_submodules(&self) -> anyhow::Result<SubmoduleInfoResult> {
        self.read(|r| r.submodules.clone())
    }

    fn is_bare_repository(&self) -> bool {
        self.repo.lock().map(|r| r.bare).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_and_failure() {
        let query = MemoryRepoQuery::new(MemoryRepo {
            branches: vec![RefDescriptor::new("refs/heads/main", "a1")],
            ..Default::default()
        });
        assert_eq!(query.local_branches().await.unwrap().len(), 1);

        query.update(|r| r.failure = Some("disk on fire".to_string()));
        let err = query.tags().await.unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
        assert!(!query.is_bare_repository());
    }
}
