//! Sync command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{build_settings, load_inputs, resolve_workspace, CliOverrides, JobContext};
use crate::git::GitCliProvider;
use crate::redact::SecretMasker;
use crate::sync::{default_state_dir, JobState, JobStateStore, SourceSynchronizer};

#[derive(Args)]
pub struct SyncArgs {
    /// Repository to synchronize, as owner/name
    #[arg(long, value_name = "OWNER/NAME")]
    pub repository: Option<String>,

    /// Branch, tag or fully qualified ref to check out
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Commit SHA to check out
    #[arg(long, value_name = "SHA")]
    pub commit: Option<String>,

    /// Working directory, relative to the workspace
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Workspace root the working directory must stay inside
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<String>,

    /// Access token used for the fetch
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Run `git clean -ffdx && git reset --hard HEAD` on a reused directory
    #[arg(long, value_name = "BOOL")]
    pub clean: Option<String>,

    /// Number of commits to fetch; 0 fetches all history
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub fetch_depth: Option<String>,

    /// Download large-file storage objects
    #[arg(long, value_name = "BOOL")]
    pub lfs: Option<String>,

    /// Keep the auth header in the local git config until `cleanup`
    #[arg(long, value_name = "BOOL")]
    pub persist_credentials: Option<String>,

    /// Not supported; any value is rejected
    #[arg(long, value_name = "VALUE")]
    pub submodules: Option<String>,

    /// Base URL of the git server
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Config file (.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE", env = "SOURCE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding job state shared with `cleanup`
    #[arg(long, value_name = "DIR", env = "SOURCE_SYNC_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

pub fn run(args: SyncArgs, masker: SecretMasker) -> Result<()> {
    let ctx = JobContext::from_env();
    if let Some(token) = args.token.as_deref().or(ctx.token.as_deref()) {
        masker.register(token);
    }

    let discovery_root = args.workspace.as_ref().map(PathBuf::from).or_else(|| ctx.workspace.clone());
    let overrides = CliOverrides {
        repository: args.repository,
        git_ref: args.git_ref,
        commit: args.commit,
        path: args.path,
        workspace: args.workspace,
        token: args.token,
        clean: args.clean,
        fetch_depth: args.fetch_depth,
        lfs: args.lfs,
        persist_credentials: args.persist_credentials,
        submodules: args.submodules,
        server_url: args.server_url,
    };
    let raw = load_inputs(discovery_root.as_deref(), args.config.as_deref(), &overrides)?;
    let settings = build_settings(&raw, &ctx)?;
    masker.register(settings.auth_token.as_str());
    tracing::debug!(?settings, "resolved settings");

    let workspace = resolve_workspace(&raw, &ctx)?;
    let state_dir = args.state_dir.unwrap_or_else(default_state_dir);
    let store = JobStateStore::for_workspace(&state_dir, &workspace);

    // Persisted before any credential is written so a teardown `cleanup`
    // finds the directory even if this process dies mid-sync.
    let mut job = JobState::default();
    job.record(&settings.repository_path, &settings.auth_config_key());
    store.save(&job).context("Unable to record the job state for cleanup")?;

    let synchronizer = SourceSynchronizer::new(GitCliProvider::new(), masker);
    let result = synchronizer.synchronize(&settings, &mut job);
    if let Err(e) = store.save(&job) {
        warn!("Unable to update the job state: {:#}", e);
    }

    let report = result.with_context(|| {
        format!("Unable to synchronize {}", settings.qualified_repository())
    })?;
    info!(
        "Checked out '{}' into '{}'{}",
        report.checkout.git_ref,
        report.repository_path.display(),
        if report.reused { " (reused existing repository)" } else { "" }
    );
    Ok(())
}
