//! Repository query backed by a repository on disk
//!
//! Every call opens the repository afresh through libgit2 on the blocking
//! pool, so the query itself stays `Send + Sync` while `git2::Repository`
//! is not. Detailed submodule status is not computed by this backend.

use super::backend::{
    ModuleChain, RefDescriptor, RemoteDescriptor, RepoQuery, SubmoduleInfo, SubmoduleInfoResult,
};
use crate::view::tree::with_trailing_slash;
use anyhow::Context;
use async_trait::async_trait;
use git2::Repository;
use std::path::{Path, PathBuf};

const HEADS: &str = "refs/heads/";
const TAGS: &str = "refs/tags/";
const REMOTES: &str = "refs/remotes/";

/// Config entries of remotes switched off by renaming their section to
/// `[-remote "name"]`
const DISABLED_REMOTE_URLS: &str = r"^-remote\..+\.url$";

#[derive(Debug, Clone)]
pub struct LocalRepoQuery {
    /// Working directory, or the git directory of a bare repository
    location: PathBuf,
    git_dir: PathBuf,
    work_dir: Option<PathBuf>,
    bare: bool,
}

impl LocalRepoQuery {
    /// Open the repository whose working directory (or bare git directory)
    /// is `path`
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("{} is not a git repository", path.display()))?;

        let git_dir = repo.path().to_path_buf();
        let work_dir = repo.workdir().map(Path::to_path_buf);
        let bare = repo.is_bare();
        tracing::debug!(git_dir = %git_dir.display(), bare, "opened repository");

        Ok(Self {
            location: work_dir.clone().unwrap_or_else(|| git_dir.clone()),
            git_dir,
            work_dir,
            bare,
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    fn require_work_dir(&self) -> anyhow::Result<PathBuf> {
        self.work_dir
            .clone()
            .context("bare repository has no working directory")
    }

    /// Run `f` against a freshly opened repository on the blocking pool
    async fn with_repo<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> anyhow::Result<T> + Send + 'static,
    {
        let location = self.location.clone();
        blocking(move || {
            let repo = Repository::open(&location)
                .with_context(|| format!("opening {}", location.display()))?;
            f(&repo)
        })
        .await
    }

    async fn refs(&self, namespace: &'static str) -> anyhow::Result<Vec<RefDescriptor>> {
        self.with_repo(move |repo| read_refs(repo, namespace)).await
    }
}

#[async_trait]
impl RepoQuery for LocalRepoQuery {
    async fn local_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.refs(HEADS).await
    }

    async fn tags(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.refs(TAGS).await
    }

    async fn remotes(&self) -> anyhow::Result<Vec<RemoteDescriptor>> {
        self.with_repo(read_remotes).await
    }

    async fn remote_branches(&self) -> anyhow::Result<Vec<RefDescriptor>> {
        self.refs(REMOTES).await
    }

    async fn module_chain(&self) -> anyhow::Result<ModuleChain> {
        let work_dir = self.require_work_dir()?;
        blocking(move || {
            let dirs = module_dirs(&work_dir);
            ModuleChain::new(dirs.iter().map(|d| posix(d)))
                .context("repository has no working directory")
        })
        .await
    }

    async fn scan_submodules(&self) -> anyhow::Result<SubmoduleInfoResult> {
        let work_dir = self.require_work_dir()?;
        blocking(move || scan(&work_dir)).await
    }

    fn is_bare_repository(&self) -> bool {
        self.bare
    }
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

fn posix(path: &Path) -> String {
    with_trailing_slash(&path.to_string_lossy().replace('\\', "/"))
}

/// Full ref name `HEAD` points at, also for an unborn branch; `None` when
/// detached
fn current_branch(repo: &Repository) -> Option<String> {
    let head = repo.find_reference("HEAD").ok()?;
    head.symbolic_target().map(str::to_string)
}

/// Direct refs under `namespace`, sorted by full name
///
/// Symbolic refs such as `refs/remotes/origin/HEAD` are skipped. Tags are
/// peeled, so an annotated tag reports the commit it points at.
fn read_refs(repo: &Repository, namespace: &str) -> anyhow::Result<Vec<RefDescriptor>> {
    let current = current_branch(repo);
    let mut refs = Vec::new();

    for reference in repo.references()? {
        let reference = reference?;
        let Some(name) = reference.name() else {
            tracing::warn!("skipping ref with a non UTF-8 name");
            continue;
        };
        if !name.starts_with(namespace) {
            continue;
        }
        let Some(target) = reference.target() else {
            continue;
        };

        let object_id = reference
            .peel_to_commit()
            .map(|commit| commit.id())
            .unwrap_or(target);
        let descriptor = RefDescriptor::new(name, &object_id.to_string());
        refs.push(if current.as_deref() == Some(name) {
            descriptor.current()
        } else {
            descriptor
        });
    }

    refs.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    Ok(refs)
}

/// Configured remotes followed by disabled ones, each name once
fn read_remotes(repo: &Repository) -> anyhow::Result<Vec<RemoteDescriptor>> {
    let mut remotes: Vec<RemoteDescriptor> = Vec::new();
    let mut add = |name: &str, enabled: bool| {
        if remotes.iter().any(|r| r.name == name) {
            return;
        }
        remotes.push(RemoteDescriptor {
            name: name.to_string(),
            enabled,
        });
    };

    for name in repo.remotes()?.iter().flatten() {
        add(name, true);
    }
    for name in disabled_remotes(repo)? {
        add(&name, false);
    }

    Ok(remotes)
}

fn disabled_remotes(repo: &Repository) -> anyhow::Result<Vec<String>> {
    let config = repo.config()?;
    let mut entries = config.entries(Some(DISABLED_REMOTE_URLS))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next() {
        let entry = entry?;
        let name = entry
            .name()
            .and_then(|n| n.strip_prefix("-remote."))
            .and_then(|n| n.strip_suffix(".url"));
        if let Some(name) = name {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Working directory of the repository that lists `work_dir` as one of its
/// submodules
fn superproject_of(work_dir: &Path) -> Option<PathBuf> {
    let parent = work_dir.parent()?;
    let repo = Repository::discover(parent).ok()?;
    let super_dir = repo.workdir()?.to_path_buf();

    let listed = repo
        .submodules()
        .ok()?
        .iter()
        .any(|submodule| super_dir.join(submodule.path()) == work_dir);
    listed.then_some(super_dir)
}

/// The module at `work_dir` and every superproject around it
fn module_dirs(work_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![work_dir.to_path_buf()];
    let mut current = work_dir.to_path_buf();

    while let Some(superproject) = superproject_of(&current) {
        dirs.push(superproject.clone());
        current = superproject;
    }

    dirs
}

/// `" [branch]"`, or `" [no branch]"` when detached
fn branch_suffix(repo: &Repository) -> String {
    match current_branch(repo) {
        Some(name) => format!(" [{}]", name.strip_prefix(HEADS).unwrap_or(&name)),
        None => " [no branch]".to_string(),
    }
}

/// Every submodule of `repo`, depth first, descending into initialised ones
fn collect_submodules(
    repo: &Repository,
    current: &Path,
    out: &mut Vec<SubmoduleInfo>,
) -> anyhow::Result<()> {
    let Some(work_dir) = repo.workdir() else {
        return Ok(());
    };

    let mut submodules = repo.submodules()?;
    submodules.sort_by(|a, b| a.path().cmp(b.path()));

    for submodule in submodules {
        let relative = submodule.path().to_string_lossy().replace('\\', "/");
        let dir = work_dir.join(submodule.path());

        // Not initialised: listed without a branch and not descended into
        match submodule.open() {
            Ok(inner) => {
                let text = format!("{relative}{}", branch_suffix(&inner));
                out.push(SubmoduleInfo::new(posix(&dir), text, dir == current));
                collect_submodules(&inner, current, out)?;
            }
            Err(_) => {
                out.push(SubmoduleInfo::new(posix(&dir), relative, dir == current));
            }
        }
    }

    Ok(())
}

fn project_info(dir: &Path) -> SubmoduleInfo {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| posix(dir));
    let suffix = Repository::open(dir)
        .map(|repo| branch_suffix(&repo))
        .unwrap_or_default();
    SubmoduleInfo::new(posix(dir), format!("{name}{suffix}"), false)
}

fn scan(work_dir: &Path) -> anyhow::Result<SubmoduleInfoResult> {
    let dirs = module_dirs(work_dir);
    let current = work_dir;
    let top = dirs.last().map(PathBuf::as_path).unwrap_or(work_dir);

    let repo = Repository::open(current)?;
    let mut ours = Vec::new();
    collect_submodules(&repo, current, &mut ours)?;

    if current == top {
        return Ok(SubmoduleInfoResult {
            our_submodules: ours,
            ..Default::default()
        });
    }

    let top_repo = Repository::open(top)?;
    let mut all = Vec::new();
    collect_submodules(&top_repo, current, &mut all)?;

    Ok(SubmoduleInfoResult {
        our_submodules: ours,
        super_submodules: all,
        top_project: Some(project_info(top)),
        super_project: dirs.get(1).map(|d| project_info(d)),
    })
}
