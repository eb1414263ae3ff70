//! Cleanup command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{load_inputs, resolve_workspace, CliOverrides, JobContext, RawInputs};
use crate::domain::{auth_config_key, DEFAULT_SERVER_URL};
use crate::git::GitCliProvider;
use crate::redact::SecretMasker;
use crate::sync::{default_state_dir, CleanupOutcome, JobStateStore, SourceSynchronizer};

#[derive(Args)]
pub struct CleanupArgs {
    /// Workspace root used by the earlier `sync`
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<String>,

    /// Directory holding job state shared with `sync`
    #[arg(long, value_name = "DIR", env = "SOURCE_SYNC_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Clean this working directory instead of the one recorded by `sync`
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,
}

/// Never fails: problems are logged so a teardown step stays green.
pub fn run(args: CleanupArgs, masker: SecretMasker) -> Result<()> {
    let ctx = JobContext::from_env();
    let synchronizer = SourceSynchronizer::new(GitCliProvider::new(), masker);

    let outcome = match args.path {
        Some(path) => {
            let server_url = ctx.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL);
            synchronizer.cleanup_path(&path, &auth_config_key(server_url))
        }
        None => {
            let discovery_root =
                args.workspace.as_ref().map(PathBuf::from).or_else(|| ctx.workspace.clone());
            let overrides = CliOverrides { workspace: args.workspace, ..CliOverrides::default() };
            let raw = load_inputs(discovery_root.as_deref(), None, &overrides).unwrap_or_else(|e| {
                warn!("Ignoring unreadable inputs during cleanup: {:#}", e);
                RawInputs::default()
            });
            let workspace = match resolve_workspace(&raw, &ctx) {
                Ok(workspace) => workspace,
                Err(e) => {
                    warn!("Nothing to clean up: {}", e);
                    return Ok(());
                }
            };

            let store =
                JobStateStore::for_workspace(&args.state_dir.unwrap_or_else(default_state_dir), &workspace);
            let mut job = match store.load() {
                Ok(job) => job,
                Err(e) => {
                    warn!("{:#}", e);
                    return Ok(());
                }
            };
            let outcome = synchronizer.cleanup(&mut job);
            if let Err(e) = store.clear() {
                warn!("{:#}", e);
            }
            outcome
        }
    };

    match outcome {
        CleanupOutcome::NothingToClean => debug!("No auth header to remove"),
        CleanupOutcome::Removed(removal) if removal.removed() => info!("Removed the auth header"),
        CleanupOutcome::Removed(_) => debug!("Auth header already absent"),
        CleanupOutcome::Failed => warn!("The auth header could not be removed"),
    }
    Ok(())
}
