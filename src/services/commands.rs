//! Repository commands issued from node and tree actions
//!
//! The trees never execute git operations themselves. They describe what the
//! user asked for as a [`RepoCommand`] and hand it to a [`CommandRunner`].
//! A finished command does not update any tree; the next repository-changed
//! notification does.

use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCommand {
    /// Select a revision in the revision grid
    SelectRevision { object_id: String },
    /// Show only the history of one ref in the revision grid
    FilterRevisionGrid { ref_name: String },
    CheckoutBranch { name: String },
    /// Checkout a tag or commit, detaching HEAD
    CheckoutRevision { revision: String },
    CheckoutRemoteBranch { remote: String, branch: String },
    CreateBranch { start_point: String },
    DeleteBranches { names: Vec<String> },
    DeleteRemoteBranch { remote: String, branch: String },
    DeleteTag { name: String },
    Merge { ref_name: String },
    Rebase { ref_name: String },
    Reset { object_id: String },
    Fetch { remote: String, branch: String },
    FetchAndMerge { remote: String, branch: String },
    FetchAndCheckout { remote: String, branch: String },
    FetchAndCreateBranch { remote: String, branch: String },
    FetchAndRebase { remote: String, branch: String },
    FetchAll { remote: String },
    Prune { remote: String },
    EnableRemote { remote: String, fetch: bool },
    DisableRemote { remote: String },
    ManageRemotes,
    /// Switch the working directory to another module
    OpenRepository { path: String },
    /// `path` is relative to the working directory `super_path`
    UpdateSubmodule { path: String, super_path: String },
    UpdateAllSubmodules,
    ManageSubmodules,
    SynchronizeSubmodules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// Executes repository commands
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: RepoCommand) -> CommandOutcome;
}

/// Logs commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunCommands;

impl CommandRunner for DryRunCommands {
    fn run(&self, command: RepoCommand) -> CommandOutcome {
        tracing::info!(?command, "dry run");
        CommandOutcome::Succeeded
    }
}

/// Remembers every command it is asked to run
#[derive(Debug)]
pub struct RecordingCommands {
    commands: Mutex<Vec<RepoCommand>>,
    outcome: CommandOutcome,
}

impl Default for RecordingCommands {
    fn default() -> Self {
        Self::with_outcome(CommandOutcome::Succeeded)
    }
}

impl RecordingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command with `outcome`
    pub fn with_outcome(outcome: CommandOutcome) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            outcome,
        }
    }

    pub fn commands(&self) -> Vec<RepoCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl CommandRunner for RecordingCommands {
    fn run(&self, command: RepoCommand) -> CommandOutcome {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        self.outcome.clone()
    }
}
