//! The transient auth header kept in the repository's local git config

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::{SyncError, SyncPhase};
use crate::git::GitCommands;

/// Written through git first and swapped for the real value in the file, so the
/// credential never shows up on a process command line.
pub const AUTH_PLACEHOLDER: &str = "AUTHORIZATION: basic ***";

/// How an auth header removal ended. Failures are errors, never outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The key was not configured.
    Absent,
    /// `git config --unset-all` removed it.
    Unset,
    /// The unset failed and the config file was rewritten without it.
    Rewritten,
}

impl RemovalOutcome {
    pub fn removed(self) -> bool {
        !matches!(self, RemovalOutcome::Absent)
    }
}

/// Base64 of `x-access-token:<token>`.
pub fn basic_credential(token: &str) -> String {
    STANDARD.encode(format!("x-access-token:{token}"))
}

pub fn header_value(credential: &str) -> String {
    format!("AUTHORIZATION: basic {credential}")
}

pub struct AuthHeaderManager<'g, G: ?Sized> {
    git: &'g G,
}

impl<'g, G: GitCommands + ?Sized> AuthHeaderManager<'g, G> {
    pub fn new(git: &'g G) -> Self {
        Self { git }
    }

    pub fn config_path(&self) -> PathBuf {
        self.git.working_directory().join(".git").join("config")
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.git
            .config_set(key, AUTH_PLACEHOLDER)
            .map_err(SyncError::phase(SyncPhase::ConfigureAuth))?;

        let path = self.config_path();
        let content = fs::read_to_string(&path)
            .map_err(|e| persistence_error(key, &path, format!("read failed: {e}")))?;
        let occurrences = content.matches(AUTH_PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(persistence_error(
                key,
                &path,
                format!("expected exactly one auth placeholder, found {occurrences}"),
            ));
        }
        fs::write(&path, content.replacen(AUTH_PLACEHOLDER, value, 1))
            .map_err(|e| persistence_error(key, &path, format!("write failed: {e}")))?;
        debug!(key = %key, "auth header configured");
        Ok(())
    }

    /// Remove `key`, falling back to rewriting the config file when git refuses.
    ///
    /// A key that survives the rewrite is an error: the credential must not outlive the job.
    pub fn remove(&self, key: &str) -> Result<RemovalOutcome, SyncError> {
        let exists = self.git.config_exists(key).map_err(SyncError::phase(SyncPhase::RemoveAuth))?;
        if !exists {
            return Ok(RemovalOutcome::Absent);
        }
        if self.git.try_config_unset(key) {
            return Ok(RemovalOutcome::Unset);
        }

        warn!(
            "Failed to remove '{}' from the git config. Attempting to remove the config value by editing the file directly.",
            key
        );
        let path = self.config_path();
        let content = fs::read_to_string(&path)
            .map_err(|e| persistence_error(key, &path, format!("read failed: {e}")))?;
        fs::write(&path, strip_key_lines(&content, key))
            .map_err(|e| persistence_error(key, &path, format!("write failed: {e}")))?;

        let still_there =
            self.git.config_exists(key).map_err(SyncError::phase(SyncPhase::RemoveAuth))?;
        if still_there {
            return Err(persistence_error(key, &path, "key still present after rewrite".to_string()));
        }
        Ok(RemovalOutcome::Rewritten)
    }
}

fn persistence_error(key: &str, path: &Path, reason: String) -> SyncError {
    SyncError::AuthPersistence { key: key.to_string(), path: path.to_path_buf(), reason }
}

/// `section[.subsection].name` split at the first and last dot.
fn split_key(key: &str) -> Option<(&str, Option<&str>, &str)> {
    let (section, rest) = key.split_once('.')?;
    match rest.rsplit_once('.') {
        Some((subsection, name)) => Some((section, Some(subsection), name)),
        None => Some((section, None, rest)),
    }
}

/// Does a `[section "subsection"]` header line address the given section?
fn header_matches(header: &str, section: &str, subsection: Option<&str>) -> bool {
    let Some(inner) = header.strip_prefix('[').and_then(|h| h.split(']').next()) else {
        return false;
    };
    let (name, sub) = match inner.split_once(char::is_whitespace) {
        Some((name, sub)) => (name, Some(sub.trim().trim_matches('"'))),
        None => (inner, None),
    };
    name.eq_ignore_ascii_case(section) && sub == subsection
}

fn entry_name(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    line.split(|c: char| c == '=' || c.is_whitespace()).next()
}

/// Drop every line mentioning `key` (case-insensitive), plus `name = ...`
/// entries inside the matching `[section "subsection"]` block as git writes them.
fn strip_key_lines(content: &str, key: &str) -> String {
    let upper_key = key.to_uppercase();
    let parts = split_key(key);
    let mut in_target = false;

    let kept: Vec<&str> = content
        .split('\n')
        .filter(|line| {
            if line.to_uppercase().contains(&upper_key) {
                return false;
            }
            let trimmed = line.trim();
            let Some((section, subsection, name)) = parts else {
                return true;
            };
            if trimmed.starts_with('[') {
                in_target = header_matches(trimmed, section, subsection);
                return true;
            }
            !(in_target && entry_name(trimmed).is_some_and(|n| n.eq_ignore_ascii_case(name)))
        })
        .collect();
    kept.join("\n")
}
