use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use repotree::config::Config;
use repotree::panel::{PanelViews, RepoObjectsTree};
use repotree::services::commands::DryRunCommands;
use repotree::services::repo::{LocalRepoQuery, RepoQuery};
use repotree::services::status::SubmoduleStatusProvider;
use repotree::services::tracing_setup;
use repotree::view::tree::{InnerLeafPolicy, TreeCategory};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// How long to wait for every tree to finish loading
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Print the branches, remotes, tags and submodules of a repository as trees
#[derive(Parser, Debug)]
#[command(name = "repotree")]
#[command(about = "Show the objects of a git repository as trees", long_about = None)]
#[command(version)]
struct Args {
    /// Repository to open (default: current directory)
    #[arg(value_name = "REPO")]
    repo: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Put a folder next to a submodule that also contains other submodules
    #[arg(long)]
    fold_inner_submodules: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_config(args: &Args) -> AnyhowResult<Config> {
    let mut config = Config::resolve(args.config.as_deref()).context("Failed to load config")?;
    if args.fold_inner_submodules {
        config.submodules.inner_leaf_policy = InnerLeafPolicy::Fold;
        config.validate()?;
    }
    Ok(config)
}

async fn run(repo: PathBuf, config: Config) -> AnyhowResult<String> {
    let query = Arc::new(
        LocalRepoQuery::open(&repo)
            .with_context(|| format!("Failed to open repository {}", repo.display()))?,
    );
    let status = SubmoduleStatusProvider::new();
    let (views, outlines) = PanelViews::outlines();
    let mut panel = RepoObjectsTree::new(
        query.clone(),
        status.clone(),
        config,
        views,
        Arc::new(DryRunCommands),
        Handle::current(),
    );

    panel.on_repository_changed();

    let scanned = match query.scan_submodules().await {
        Ok(snapshot) => {
            status.publish(snapshot);
            true
        }
        Err(e) => {
            tracing::warn!("submodule scan failed: {e:#}");
            false
        }
    };

    tokio::time::timeout(SETTLE_TIMEOUT, async {
        panel
            .run_until(|p| !scanned || p.tree(TreeCategory::Submodules).has_filled())
            .await;
        panel.settle().await;
    })
    .await
    .context("Timed out waiting for the trees to load")?;

    for category in TreeCategory::ALL {
        if let Some(error) = panel.tree(category).last_error() {
            eprintln!("Warning: {} could not be loaded: {}", category.title(), error);
        }
    }

    Ok(outlines.render())
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("repotree.log"));
    if !tracing_setup::init_global(&log_file) {
        eprintln!("Warning: logging disabled, could not open {}", log_file.display());
    }
    tracing::info!("repotree starting");

    let repo = match args.repo {
        Some(repo) => repo,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let outline = runtime.block_on(run(repo, config))?;
    print!("{outline}");

    Ok(())
}
