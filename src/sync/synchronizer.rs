//! Source synchronizer: drive a working directory to the requested ref

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::auth::{basic_credential, header_value, AuthHeaderManager, RemovalOutcome};
use super::error::{SyncError, SyncPhase};
use super::reconcile::{try_reconcile, ReconcileOutcome};
use super::state::JobState;
use crate::domain::{CheckoutInfo, SyncSettings};
use crate::git::{refs, GitCommands, GitProvider};
use crate::redact::SecretMasker;
use crate::utils::fs::{directory_exists, file_exists, remove_dir_contents, remove_path};

/// What a successful synchronization did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub repository_path: PathBuf,
    /// The existing clone was reconciled instead of recreated.
    pub reused: bool,
    pub checkout: CheckoutInfo,
    /// One line of commit metadata for the checked-out HEAD.
    pub commit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No git config at the path; nothing was touched.
    NothingToClean,
    Removed(RemovalOutcome),
    /// Removal failed; already logged.
    Failed,
}

pub struct SourceSynchronizer<P> {
    provider: P,
    masker: SecretMasker,
}

impl<P: GitProvider> SourceSynchronizer<P> {
    pub fn new(provider: P, masker: SecretMasker) -> Self {
        Self { provider, masker }
    }

    pub fn synchronize(
        &self,
        settings: &SyncSettings,
        job: &mut JobState,
    ) -> Result<SyncReport, SyncError> {
        info!("Syncing repository: {}", settings.qualified_repository());
        let path = settings.repository_path.as_path();
        let repository_url = settings.repository_url();

        // Something that is not a directory can never be reused.
        if file_exists(path) {
            remove_path(path).map_err(SyncError::directory(path))?;
        }

        let mut freshly_created = false;
        if !directory_exists(path) {
            fs::create_dir_all(path).map_err(SyncError::directory(path))?;
            freshly_created = true;
        }

        let git = self.provider.open(path, settings.lfs).map_err(SyncError::phase(SyncPhase::OpenGit))?;

        let mut reused = false;
        if !freshly_created {
            match try_reconcile(&git, path, &repository_url, settings.clean) {
                ReconcileOutcome::Reused => reused = true,
                ReconcileOutcome::Refused(reason) => {
                    info!("Deleting the contents of '{}' ({})", path.display(), reason.describe());
                    remove_dir_contents(path).map_err(SyncError::directory(path))?;
                }
            }
        }

        // Recorded before the credential is written so a teardown after a
        // failure below can still find and remove it.
        let auth_key = settings.auth_config_key();
        job.record(path, &auth_key);

        if !directory_exists(&path.join(".git")) {
            git.init().map_err(SyncError::phase(SyncPhase::Initialize))?;
            git.remote_add("origin", &repository_url)
                .map_err(SyncError::phase(SyncPhase::Initialize))?;
        }

        if !git.try_disable_automatic_gc() {
            warn!("Unable to turn off git automatic garbage collection. The git fetch operation may trigger garbage collection and cause a delay.");
        }

        let auth = AuthHeaderManager::new(&git);
        auth.remove(&auth_key)?;

        let result = self.fetch_and_checkout(&git, &auth, &auth_key, settings);

        if !settings.persist_credentials {
            let removed = auth.remove(&auth_key);
            if let Err(e) = removed {
                // A fetch failure is the more useful error to surface; the
                // removal failure still reaches the log.
                if result.is_ok() {
                    return Err(e);
                }
                warn!("{}", e);
            }
        }

        let (checkout, commit) = result?;
        Ok(SyncReport { repository_path: path.to_path_buf(), reused, checkout, commit })
    }

    fn fetch_and_checkout<G: GitCommands>(
        &self,
        git: &G,
        auth: &AuthHeaderManager<'_, G>,
        auth_key: &str,
        settings: &SyncSettings,
    ) -> Result<(CheckoutInfo, String), SyncError> {
        let credential = basic_credential(&settings.auth_token);
        self.masker.register(settings.auth_token.as_str());
        self.masker.register(credential.as_str());
        auth.set(auth_key, &header_value(&credential))?;

        if settings.lfs {
            git.lfs_install().map_err(SyncError::phase(SyncPhase::LfsInstall))?;
        }

        info!("Fetching the repository");
        let refspec = refs::get_ref_spec(&settings.git_ref, &settings.commit)
            .map_err(SyncError::phase(SyncPhase::Fetch))?;
        git.fetch(settings.fetch_depth, &refspec).map_err(SyncError::phase(SyncPhase::Fetch))?;

        let checkout = refs::get_checkout_info(git, &settings.git_ref, &settings.commit)
            .map_err(SyncError::phase(SyncPhase::ResolveCheckout))?;
        debug!(git_ref = %checkout.git_ref, start_point = ?checkout.start_point, "checkout target");

        // Fetching up front downloads objects in parallel; checkout would fetch them one by one.
        if settings.lfs {
            info!("Fetching LFS objects");
            git.lfs_fetch(checkout.fetch_target()).map_err(SyncError::phase(SyncPhase::LfsFetch))?;
        }

        info!("Checking out the ref");
        git.checkout(&checkout.git_ref, checkout.start_point.as_deref())
            .map_err(SyncError::phase(SyncPhase::Checkout))?;

        let commit = git.log1().map_err(SyncError::phase(SyncPhase::Log))?;
        info!("{}", commit);
        Ok((checkout, commit))
    }

    /// Remove the auth header recorded in `job`. Never fails the caller.
    pub fn cleanup(&self, job: &mut JobState) -> CleanupOutcome {
        let target = job.take();
        job.clear();
        match target {
            Some(target) => self.cleanup_path(&target.repository_path, &target.auth_config_key),
            None => {
                debug!("No repository path recorded for this job");
                CleanupOutcome::NothingToClean
            }
        }
    }

    pub fn cleanup_path(&self, path: &Path, auth_key: &str) -> CleanupOutcome {
        if !file_exists(&path.join(".git").join("config")) {
            return CleanupOutcome::NothingToClean;
        }
        let git = match self.provider.open(path, false) {
            Ok(git) => git,
            Err(e) => {
                warn!("Unable to open '{}' for cleanup: {}", path.display(), e);
                return CleanupOutcome::Failed;
            }
        };
        match AuthHeaderManager::new(&git).remove(auth_key) {
            Ok(outcome) => CleanupOutcome::Removed(outcome),
            Err(e) => {
                warn!("{}", e);
                CleanupOutcome::Failed
            }
        }
    }
}
