//! Synchronization error taxonomy

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::git::GitError;

/// Fatal phases of a synchronization, named in every [`SyncError::Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    OpenGit,
    Initialize,
    ConfigureAuth,
    RemoveAuth,
    LfsInstall,
    Fetch,
    ResolveCheckout,
    LfsFetch,
    Checkout,
    Log,
}

impl SyncPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncPhase::OpenGit => "open git",
            SyncPhase::Initialize => "initialize repository",
            SyncPhase::ConfigureAuth => "configure auth header",
            SyncPhase::RemoveAuth => "remove auth header",
            SyncPhase::LfsInstall => "lfs install",
            SyncPhase::Fetch => "fetch",
            SyncPhase::ResolveCheckout => "resolve checkout target",
            SyncPhase::LfsFetch => "lfs fetch",
            SyncPhase::Checkout => "checkout",
            SyncPhase::Log => "log commit",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("the input '{0}' is not supported")]
    Unsupported(&'static str),

    #[error("unable to prepare directory '{}': {source}", path.display())]
    DirectoryConflict {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{phase} failed: {source}")]
    Phase {
        phase: SyncPhase,
        #[source]
        source: GitError,
    },

    #[error("auth header '{key}' in '{}' could not be safely updated: {reason}", path.display())]
    AuthPersistence { key: String, path: PathBuf, reason: String },
}

impl SyncError {
    pub fn phase(phase: SyncPhase) -> impl FnOnce(GitError) -> SyncError {
        move |source| SyncError::Phase { phase, source }
    }

    pub fn directory(path: &Path) -> impl FnOnce(io::Error) -> SyncError + '_ {
        move |source| SyncError::DirectoryConflict { path: path.to_path_buf(), source }
    }
}
