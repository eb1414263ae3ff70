//! Decide whether an existing working directory can be reused in place

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::git::{GitCommands, GitError};

/// Stale lock files a killed git process can leave behind.
const LOCK_FILES: [&str; 2] = ["index.lock", "shallow.lock"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Reused,
    Refused(RefusalReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    NotARepository,
    UrlMismatch,
    RefCleanupFailed,
    CleanFailed,
    ResetFailed,
}

impl RefusalReason {
    pub fn describe(self) -> &'static str {
        match self {
            RefusalReason::NotARepository => "no git metadata directory",
            RefusalReason::UrlMismatch => "fetch URL does not match",
            RefusalReason::RefCleanupFailed => "unable to remove existing refs",
            RefusalReason::CleanFailed => "git clean failed",
            RefusalReason::ResetFailed => "git reset failed",
        }
    }
}

/// Try to reuse the repository at `path`; never fails, only refuses.
pub fn try_reconcile<G: GitCommands + ?Sized>(
    git: &G,
    path: &Path,
    expected_url: &str,
    clean: bool,
) -> ReconcileOutcome {
    let git_dir = path.join(".git");
    if !git_dir.is_dir() {
        return ReconcileOutcome::Refused(RefusalReason::NotARepository);
    }
    let fetch_url = git.try_get_fetch_url();
    if fetch_url != expected_url {
        debug!(found = %fetch_url, expected = %expected_url, "fetch URL mismatch");
        return ReconcileOutcome::Refused(RefusalReason::UrlMismatch);
    }

    remove_stale_locks(&git_dir);

    if let Err(e) = remove_all_refs(git) {
        warn!(
            "Unable to prepare the existing repository. The repository will be recreated instead. ({})",
            e
        );
        return ReconcileOutcome::Refused(RefusalReason::RefCleanupFailed);
    }

    if clean {
        let refusal = if !git.try_clean() {
            debug!(
                "The clean command failed. This might be caused by: 1) path too long, 2) permission issue, or 3) file in use. For further investigation, manually run 'git clean -ffdx' on the directory '{}'.",
                path.display()
            );
            Some(RefusalReason::CleanFailed)
        } else if !git.try_reset() {
            Some(RefusalReason::ResetFailed)
        } else {
            None
        };
        if let Some(reason) = refusal {
            warn!("Unable to clean or reset the repository. The repository will be recreated instead.");
            return ReconcileOutcome::Refused(reason);
        }
    }

    info!("Reusing existing repository at '{}'", path.display());
    ReconcileOutcome::Reused
}

fn remove_stale_locks(git_dir: &Path) {
    for name in LOCK_FILES {
        let lock = git_dir.join(name);
        match fs::remove_file(&lock) {
            Ok(()) => debug!("Removed stale lock '{}'", lock.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!("Unable to delete '{}'. {}", lock.display(), e),
        }
    }
}

/// Detach HEAD, then delete every local branch and every `origin` tracking ref.
fn remove_all_refs<G: GitCommands + ?Sized>(git: &G) -> Result<(), GitError> {
    // A checked-out branch cannot be deleted.
    if !git.is_detached()? {
        git.checkout_detach()?;
    }
    for branch in git.branch_list(false)? {
        git.branch_delete(false, &branch)?;
    }
    for branch in git.branch_list(true)? {
        git.branch_delete(true, &branch)?;
    }
    Ok(())
}
