//! Job-scoped state handed from `sync` to a later `cleanup`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::stable_key;

/// Caller-owned context: written during synchronize, read once by cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_config_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
}

/// What cleanup needs, taken out of a [`JobState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupTarget {
    pub repository_path: PathBuf,
    pub auth_config_key: String,
}

impl JobState {
    pub fn record(&mut self, repository_path: &Path, auth_config_key: &str) {
        self.repository_path = Some(repository_path.to_path_buf());
        self.auth_config_key = Some(auth_config_key.to_string());
        self.recorded_at = Some(Utc::now());
    }

    pub fn repository_path(&self) -> Option<&Path> {
        self.repository_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.repository_path.is_none()
    }

    /// Read-once: the state is empty afterwards.
    pub fn take(&mut self) -> Option<CleanupTarget> {
        let repository_path = self.repository_path.take()?;
        let auth_config_key = self.auth_config_key.take()?;
        self.recorded_at = None;
        Some(CleanupTarget { repository_path, auth_config_key })
    }

    pub fn clear(&mut self) {
        *self = JobState::default();
    }
}

/// Persists a [`JobState`] between the separate `sync` and `cleanup` processes of one job.
#[derive(Debug, Clone)]
pub struct JobStateStore {
    path: PathBuf,
}

impl JobStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state_dir>/source-sync/<hash of workspace>.json`
    pub fn for_workspace(state_dir: &Path, workspace: &Path) -> Self {
        let key = stable_key(&workspace.to_string_lossy());
        Self::new(state_dir.join("source-sync").join(format!("{key}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<JobState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(JobState::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed reading job state: {}", self.path.display()))
            }
        };
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid job state file: {}", self.path.display()))
    }

    pub fn save(&self, state: &JobState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating state directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed writing job state: {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed removing job state: {}", self.path.display())),
        }
    }
}

/// Where job state lives when no directory is given explicitly.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SOURCE_SYNC_STATE_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os("RUNNER_TEMP").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    std::env::temp_dir()
}
