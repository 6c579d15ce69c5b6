//! Repository query abstraction
//!
//! Everything the trees know about a repository comes through [`RepoQuery`].
//! The local implementation reads a `.git` directory; tests use the
//! in-memory one, optionally wrapped in the slow decorator.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;

/// A branch, remote-tracking branch or tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDescriptor {
    /// Short name, e.g. `feature/x`, `origin/feature/x` or `v1.0`
    pub name: String,
    /// Full ref name, e.g. `refs/heads/feature/x`
    pub full_name: String,
    pub object_id: String,
    pub is_current_branch: bool,
}

impl RefDescriptor {
    pub fn new(full_name: &str, object_id: &str) -> Self {
        let name = ["refs/heads/", "refs/remotes/", "refs/tags/"]
            .iter()
            .find_map(|prefix| full_name.strip_prefix(prefix))
            .unwrap_or(full_name);

        Self {
            name: name.to_string(),
            full_name: full_name.to_string(),
            object_id: object_id.to_string(),
            is_current_branch: false,
        }
    }

    pub fn current(mut self) -> Self {
        self.is_current_branch = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    pub name: String,
    pub enabled: bool,
}

/// How a submodule's checked-out commit relates to the one recorded upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmoduleStatus {
    FastForward,
    Rewind,
    NewerTime,
    OlderTime,
    SameTime,
    NewSubmodule,
    Unknown,
}

/// Extended status, available some time after the submodule list itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetailedSubmoduleInfo {
    pub status: Option<SubmoduleStatus>,
    pub is_dirty: bool,
}

/// Shareable handle to a submodule's pending detailed status
///
/// Every clone resolves to the same value; the underlying work runs once.
#[derive(Clone)]
pub struct DetailHandle(Shared<BoxFuture<'static, Option<DetailedSubmoduleInfo>>>);

impl DetailHandle {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Option<DetailedSubmoduleInfo>> + Send + 'static,
    {
        Self(future.boxed().shared())
    }

    pub fn ready(details: DetailedSubmoduleInfo) -> Self {
        Self::new(futures::future::ready(Some(details)))
    }

    pub async fn get(&self) -> Option<DetailedSubmoduleInfo> {
        self.0.clone().await
    }
}

impl fmt::Debug for DetailHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.0.peek() {
            Some(details) => format!("{details:?}"),
            None => "pending".to_string(),
        };
        f.debug_tuple("DetailHandle").field(&state).finish()
    }
}

/// One submodule as reported by the status source
#[derive(Debug, Clone)]
pub struct SubmoduleInfo {
    /// Absolute working directory, `/`-separated, with a trailing `/`
    pub path: String,
    /// `"<path in super project> [<branch>]"`; the branch part is missing
    /// until the submodule is initialised
    pub text: String,
    /// Set for the module that is currently open
    pub bold: bool,
    pub detailed: Option<DetailHandle>,
}

impl SubmoduleInfo {
    pub fn new(path: impl Into<String>, text: impl Into<String>, bold: bool) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            bold,
            detailed: None,
        }
    }

    pub fn with_details(mut self, handle: DetailHandle) -> Self {
        self.detailed = Some(handle);
        self
    }
}

/// Complete snapshot of the submodule structure around the open module
#[derive(Debug, Clone, Default)]
pub struct SubmoduleInfoResult {
    /// Submodules of the open module, recursively
    pub our_submodules: Vec<SubmoduleInfo>,
    /// Submodules of the top project, recursively; empty when the open
    /// module is the top project
    pub super_submodules: Vec<SubmoduleInfo>,
    pub top_project: Option<SubmoduleInfo>,
    pub super_project: Option<SubmoduleInfo>,
}

impl SubmoduleInfoResult {
    /// Submodules to display, always rooted at the top project
    pub fn displayed(&self) -> &[SubmoduleInfo] {
        if self.super_submodules.is_empty() {
            &self.our_submodules
        } else {
            &self.super_submodules
        }
    }
}

/// Working directories from the open module outwards
///
/// Entries are `/`-separated and end with `/`. The first entry is the open
/// module; the last one is the top project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChain {
    modules: Vec<String>,
}

impl ModuleChain {
    /// Build a chain; returns `None` for an empty list
    pub fn new<I, S>(modules: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let modules: Vec<String> = modules
            .into_iter()
            .map(|m| crate::view::tree::with_trailing_slash(m.as_ref()))
            .collect();
        if modules.is_empty() {
            None
        } else {
            Some(Self { modules })
        }
    }

    pub fn current(&self) -> &str {
        &self.modules[0]
    }

    pub fn top(&self) -> &str {
        &self.modules[self.modules.len() - 1]
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}

/// Source of repository objects
#[async_trait]
pub trait RepoQuery: Send + Sync {
    async fn local_branches(&self) -> anyhow::Result<Vec<RefDescriptor>>;

    async fn tags(&self) -> anyhow::Result<Vec<RefDescriptor>>;

    /// Enabled and disabled remotes, in configuration order
    async fn remotes(&self) -> anyhow::Result<Vec<RemoteDescriptor>>;

    async fn remote_branches(&self) -> anyhow::Result<Vec<RefDescriptor>>;

    async fn module_chain(&self) -> anyhow::Result<ModuleChain>;

    /// Recursive submodule scan, used to seed the status provider
    async fn scan_submodules(&self) -> anyhow::Result<SubmoduleInfoResult>;

    fn is_bare_repository(&self) -> bool;
}
