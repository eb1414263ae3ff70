//! What the surrounding job runner tells us about the current job

use std::env;
use std::path::PathBuf;

/// Job metadata read from the runner's environment. Every field is optional;
/// explicit inputs take precedence over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    pub workspace: Option<PathBuf>,
    /// `owner/name` of the repository whose event started the job.
    pub repository: Option<String>,
    pub event_ref: Option<String>,
    pub event_sha: Option<String>,
    pub server_url: Option<String>,
    pub token: Option<String>,
}

impl JobContext {
    pub fn from_env() -> Self {
        Self {
            workspace: non_empty_var("GITHUB_WORKSPACE").map(PathBuf::from),
            repository: non_empty_var("GITHUB_REPOSITORY"),
            event_ref: non_empty_var("GITHUB_REF"),
            event_sha: non_empty_var("GITHUB_SHA"),
            server_url: non_empty_var("GITHUB_SERVER_URL"),
            token: non_empty_var("GITHUB_TOKEN"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
