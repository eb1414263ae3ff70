//! The version-control command interface consumed by the synchronizer

use std::path::Path;

use super::error::GitError;

/// Discrete git operations bound to one working directory.
///
/// Operations prefixed with `try_` are best-effort: they report failure as
/// `false` instead of an error and the caller decides whether that matters.
pub trait GitCommands {
    fn working_directory(&self) -> &Path;

    fn init(&self) -> Result<(), GitError>;

    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError>;

    #[must_use]
    fn try_disable_automatic_gc(&self) -> bool;

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError>;

    fn config_exists(&self, key: &str) -> Result<bool, GitError>;

    #[must_use]
    fn try_config_unset(&self, key: &str) -> bool;

    /// Depth 0 fetches full history, unshallowing a previously shallow clone.
    fn fetch(&self, depth: u32, refspec: &[String]) -> Result<(), GitError>;

    fn lfs_install(&self) -> Result<(), GitError>;

    fn lfs_fetch(&self, git_ref: &str) -> Result<(), GitError>;

    fn checkout(&self, git_ref: &str, start_point: Option<&str>) -> Result<(), GitError>;

    fn checkout_detach(&self) -> Result<(), GitError>;

    fn is_detached(&self) -> Result<bool, GitError>;

    /// Local branch names, or remote-tracking names under `origin` when `remote` is set.
    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError>;

    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError>;

    fn branch_exists(&self, remote: bool, pattern: &str) -> Result<bool, GitError>;

    fn tag_exists(&self, pattern: &str) -> Result<bool, GitError>;

    #[must_use]
    fn try_clean(&self) -> bool;

    #[must_use]
    fn try_reset(&self) -> bool;

    /// The `origin` fetch URL, or an empty string when unset or ambiguous.
    fn try_get_fetch_url(&self) -> String;

    /// One line describing the checked-out commit.
    fn log1(&self) -> Result<String, GitError>;
}

/// Opens a [`GitCommands`] bound to a working directory.
pub trait GitProvider {
    type Git: GitCommands;

    fn open(&self, working_directory: &Path, lfs: bool) -> Result<Self::Git, GitError>;
}
