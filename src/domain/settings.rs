//! Resolved synchronization settings and checkout targets

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Characters left untouched when encoding a single URL path component.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Everything one synchronization needs, already validated upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Absolute working-directory path inside the job workspace.
    pub repository_path: PathBuf,
    pub repository_owner: String,
    pub repository_name: String,
    /// Branch, tag or fully qualified ref. May be empty when `commit` is set.
    pub git_ref: String,
    /// 40-character commit SHA. May be empty when `git_ref` is set.
    pub commit: String,
    pub clean: bool,
    /// 0 fetches full history.
    pub fetch_depth: u32,
    pub lfs: bool,
    /// Keep the auth header after `synchronize` returns, for removal by a later cleanup.
    pub persist_credentials: bool,
    pub server_url: String,
    pub auth_token: String,
}

impl SyncSettings {
    pub fn qualified_repository(&self) -> String {
        format!("{}/{}", self.repository_owner, self.repository_name)
    }

    /// `<server>/<owner>/<name>` with both path components percent-encoded.
    pub fn repository_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.server_url.trim_end_matches('/'),
            utf8_percent_encode(&self.repository_owner, PATH_COMPONENT),
            utf8_percent_encode(&self.repository_name, PATH_COMPONENT),
        )
    }

    pub fn auth_config_key(&self) -> String {
        auth_config_key(&self.server_url)
    }
}

/// The single config key that carries the transient auth header for `server_url`.
pub fn auth_config_key(server_url: &str) -> String {
    format!("http.{}/.extraheader", server_url.trim_end_matches('/'))
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSettings")
            .field("repository_path", &self.repository_path)
            .field("repository_owner", &self.repository_owner)
            .field("repository_name", &self.repository_name)
            .field("git_ref", &self.git_ref)
            .field("commit", &self.commit)
            .field("clean", &self.clean)
            .field("fetch_depth", &self.fetch_depth)
            .field("lfs", &self.lfs)
            .field("persist_credentials", &self.persist_credentials)
            .field("server_url", &self.server_url)
            .field("auth_token", &"***")
            .finish()
    }
}

/// Concrete checkout target produced by the ref resolver and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInfo {
    pub git_ref: String,
    pub start_point: Option<String>,
}

impl CheckoutInfo {
    /// The ref large-file objects should be fetched for.
    pub fn fetch_target(&self) -> &str {
        self.start_point.as_deref().unwrap_or(&self.git_ref)
    }
}
