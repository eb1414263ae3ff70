//! Raw inputs and their normalization into [`SyncSettings`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::context::JobContext;
use crate::domain::{SyncSettings, DEFAULT_SERVER_URL};
use crate::git::refs::{is_commit_sha, normalize_ref};
use crate::sync::SyncError;
use crate::utils::normalize_lexically;

pub const DEFAULT_REF: &str = "refs/heads/master";
pub const DEFAULT_FETCH_DEPTH: u32 = 1;

/// A loosely typed flag or count. Config files and environment variables hand
/// back booleans and numbers; the CLI hands back text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl InputValue {
    fn is_blank(&self) -> bool {
        matches!(self, InputValue::Text(t) if t.trim().is_empty())
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Bool(b) => write!(f, "{b}"),
            InputValue::Int(i) => write!(f, "{i}"),
            InputValue::Float(x) => write!(f, "{x}"),
            InputValue::Text(t) => f.write_str(t.trim()),
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

/// Every input as supplied, before defaults and validation.
///
/// Text inputs stay `String`: a number where a ref, path or SHA belongs is
/// refused rather than re-rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_depth: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_credentials: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodules: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

fn text(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Only an explicit `true` (any case) enables a flag; anything else disables it.
pub fn parse_bool(value: &Option<InputValue>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) if v.is_blank() => default,
        Some(InputValue::Bool(b)) => *b,
        Some(other) => other.to_string().eq_ignore_ascii_case("true"),
    }
}

/// Missing → 1. Negative or non-numeric → 0 (full history).
pub fn parse_fetch_depth(value: &Option<InputValue>) -> u32 {
    let number = match value {
        None => return DEFAULT_FETCH_DEPTH,
        Some(v) if v.is_blank() => return DEFAULT_FETCH_DEPTH,
        Some(InputValue::Int(i)) => *i as f64,
        Some(InputValue::Float(x)) => *x,
        Some(InputValue::Bool(_)) => f64::NAN,
        Some(InputValue::Text(t)) => t.trim().parse::<f64>().unwrap_or(f64::NAN),
    };
    if number.is_nan() || number < 0.0 {
        return 0;
    }
    number.floor().min(f64::from(u32::MAX)) as u32
}

fn parse_repository(qualified: &str) -> Result<(String, String), SyncError> {
    let parts: Vec<&str> = qualified.split('/').collect();
    match parts.as_slice() {
        [owner, name] if !owner.trim().is_empty() && !name.trim().is_empty() => {
            Ok((owner.trim().to_string(), name.trim().to_string()))
        }
        _ => Err(SyncError::Configuration(format!(
            "Invalid repository '{qualified}'. Expected format {{owner}}/{{repo}}."
        ))),
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, SyncError> {
    if path.is_absolute() {
        return Ok(normalize_lexically(&path));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| SyncError::Configuration(format!("Unable to resolve the current directory: {e}")))?;
    Ok(normalize_lexically(&cwd.join(path)))
}

fn resolve_repository_path(workspace: &Path, path: Option<String>) -> Result<PathBuf, SyncError> {
    let relative = path.unwrap_or_else(|| ".".to_string());
    let resolved = normalize_lexically(&workspace.join(&relative));
    if !resolved.starts_with(workspace) {
        return Err(SyncError::Configuration(format!(
            "Repository path '{}' is not under '{}'",
            resolved.display(),
            workspace.display()
        )));
    }
    Ok(resolved)
}

/// The absolute workspace root: the `workspace` input, else the runner's.
pub fn resolve_workspace(raw: &RawInputs, ctx: &JobContext) -> Result<PathBuf, SyncError> {
    let workspace = text(&raw.workspace)
        .map(PathBuf::from)
        .or_else(|| ctx.workspace.clone())
        .ok_or_else(|| SyncError::Configuration("GITHUB_WORKSPACE not defined".to_string()))?;
    absolute(workspace)
}

/// Apply defaults and validation to produce the settings for one synchronization.
pub fn build_settings(raw: &RawInputs, ctx: &JobContext) -> Result<SyncSettings, SyncError> {
    let workspace = resolve_workspace(raw, ctx)?;

    let qualified = text(&raw.repository)
        .or_else(|| ctx.repository.clone())
        .ok_or_else(|| SyncError::Configuration("Input required and not supplied: repository".to_string()))?;
    let (owner, name) = parse_repository(&qualified)?;

    let repository_path = resolve_repository_path(&workspace, text(&raw.path))?;

    if let Some(submodules) = raw.submodules.as_ref().filter(|v| !v.is_blank()) {
        tracing::debug!(submodules = %submodules, "submodules input rejected");
        return Err(SyncError::Unsupported("submodules"));
    }

    let is_workflow_repository = ctx
        .repository
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case(&format!("{owner}/{name}")));

    let mut git_ref = text(&raw.git_ref).unwrap_or_default();
    let mut commit = text(&raw.commit).unwrap_or_default();
    if git_ref.is_empty() && commit.is_empty() && is_workflow_repository {
        git_ref = ctx.event_ref.clone().unwrap_or_default();
        commit = ctx.event_sha.clone().unwrap_or_default();
        // Some events carry an unqualified branch name alongside the commit.
        if !commit.is_empty() && !git_ref.is_empty() && !git_ref.starts_with("refs/") {
            git_ref = format!("refs/heads/{git_ref}");
        }
    }
    if git_ref.is_empty() && commit.is_empty() {
        git_ref = DEFAULT_REF.to_string();
    }
    let (git_ref, commit) = normalize_ref(&git_ref, &commit);
    if !commit.is_empty() && !is_commit_sha(&commit) {
        return Err(SyncError::Configuration(format!(
            "Invalid commit '{commit}'. Expected a 40-character hex SHA."
        )));
    }

    let auth_token = text(&raw.token)
        .or_else(|| ctx.token.clone())
        .ok_or_else(|| SyncError::Configuration("Input required and not supplied: token".to_string()))?;

    let server_url = text(&raw.server_url)
        .or_else(|| ctx.server_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    Ok(SyncSettings {
        repository_path,
        repository_owner: owner,
        repository_name: name,
        git_ref,
        commit,
        clean: parse_bool(&raw.clean, true),
        fetch_depth: parse_fetch_depth(&raw.fetch_depth),
        lfs: parse_bool(&raw.lfs, false),
        persist_credentials: parse_bool(&raw.persist_credentials, true),
        server_url,
        auth_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "1234567890abcdef1234567890abcdef12345678";

    fn ctx() -> JobContext {
        JobContext {
            workspace: Some(PathBuf::from("/work/repo")),
            repository: Some("octo/repo".to_string()),
            event_ref: Some("refs/heads/feature".to_string()),
            event_sha: Some(SHA.to_string()),
            server_url: None,
            token: Some("job-token".to_string()),
        }
    }

    fn build(raw: RawInputs) -> Result<SyncSettings, SyncError> {
        build_settings(&raw, &ctx())
    }

    #[test]
    fn defaults_follow_the_job_context() {
        let settings = build(RawInputs::default()).expect("settings");
        assert_eq!(settings.repository_path, PathBuf::from("/work/repo"));
        assert_eq!(settings.qualified_repository(), "octo/repo");
        assert_eq!(settings.git_ref, "refs/heads/feature");
        assert_eq!(settings.commit, SHA);
        assert!(settings.clean);
        assert!(!settings.lfs);
        assert!(settings.persist_credentials);
        assert_eq!(settings.fetch_depth, 1);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.auth_token, "job-token");
    }

    #[test]
    fn other_repository_defaults_to_master_without_event_commit() {
        let raw = RawInputs { repository: Some("other/project".into()), ..RawInputs::default() };
        let settings = build(raw).expect("settings");
        assert_eq!(settings.git_ref, DEFAULT_REF);
        assert!(settings.commit.is_empty());
    }

    #[test]
    fn workflow_repository_match_ignores_case() {
        let raw = RawInputs { repository: Some("Octo/Repo".into()), ..RawInputs::default() };
        assert_eq!(build(raw).expect("settings").commit, SHA);
    }

    #[test]
    fn unqualified_event_ref_is_qualified_as_branch() {
        let mut context = ctx();
        context.event_ref = Some("main".to_string());
        let settings = build_settings(&RawInputs::default(), &context).expect("settings");
        assert_eq!(settings.git_ref, "refs/heads/main");
    }

    #[test]
    fn explicit_ref_skips_event_commit() {
        let raw = RawInputs { git_ref: Some("v1.2.0".into()), ..RawInputs::default() };
        let settings = build(raw).expect("settings");
        assert_eq!(settings.git_ref, "v1.2.0");
        assert!(settings.commit.is_empty());
    }

    #[test]
    fn sha_shaped_ref_becomes_the_commit() {
        let raw = RawInputs { git_ref: Some(SHA.into()), ..RawInputs::default() };
        let settings = build(raw).expect("settings");
        assert!(settings.git_ref.is_empty());
        assert_eq!(settings.commit, SHA);
    }

    #[test]
    fn malformed_commit_is_rejected() {
        let raw = RawInputs { commit: Some("abc123".into()), ..RawInputs::default() };
        assert!(matches!(build(raw), Err(SyncError::Configuration(_))));
    }

    #[test]
    fn fetch_depth_normalization() {
        assert_eq!(parse_fetch_depth(&None), 1);
        assert_eq!(parse_fetch_depth(&Some("".into())), 1);
        assert_eq!(parse_fetch_depth(&Some(InputValue::Int(0))), 0);
        assert_eq!(parse_fetch_depth(&Some(InputValue::Int(-1))), 0);
        assert_eq!(parse_fetch_depth(&Some("-1".into())), 0);
        assert_eq!(parse_fetch_depth(&Some("deep".into())), 0);
        assert_eq!(parse_fetch_depth(&Some(" 25 ".into())), 25);
        assert_eq!(parse_fetch_depth(&Some(InputValue::Float(3.7))), 3);
        assert_eq!(parse_fetch_depth(&Some(InputValue::Bool(true))), 0);
    }

    #[test]
    fn boolean_inputs_only_accept_true() {
        assert!(parse_bool(&None, true));
        assert!(parse_bool(&Some("TRUE".into()), false));
        assert!(!parse_bool(&Some("yes".into()), true));
        assert!(!parse_bool(&Some(InputValue::Bool(false)), true));
        assert!(parse_bool(&Some("  ".into()), true));
    }

    #[test]
    fn path_is_resolved_inside_the_workspace() {
        let raw = RawInputs { path: Some("nested/../src".into()), ..RawInputs::default() };
        assert_eq!(build(raw).expect("settings").repository_path, PathBuf::from("/work/repo/src"));
    }

    #[test]
    fn path_escaping_the_workspace_is_rejected() {
        let raw = RawInputs { path: Some("../sibling".into()), ..RawInputs::default() };
        let err = build(raw).expect_err("outside workspace");
        assert!(err.to_string().contains("is not under"), "got: {err}");
    }

    #[test]
    fn repository_must_be_owner_slash_name() {
        for bad in ["octo", "octo/", "/repo", "a/b/c"] {
            let raw = RawInputs { repository: Some(bad.into()), ..RawInputs::default() };
            assert!(matches!(build(raw), Err(SyncError::Configuration(_))), "accepted {bad}");
        }
    }

    #[test]
    fn submodules_are_unsupported() {
        let raw = RawInputs { submodules: Some("recursive".into()), ..RawInputs::default() };
        assert!(matches!(build(raw), Err(SyncError::Unsupported("submodules"))));
    }

    #[test]
    fn token_is_required() {
        let mut context = ctx();
        context.token = None;
        let err = build_settings(&RawInputs::default(), &context).expect_err("no token");
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn workspace_is_required() {
        let mut context = ctx();
        context.workspace = None;
        assert!(matches!(
            build_settings(&RawInputs::default(), &context),
            Err(SyncError::Configuration(_))
        ));
    }

    #[test]
    fn server_url_trailing_slash_is_trimmed() {
        let raw = RawInputs {
            server_url: Some("https://ghe.example.com/".into()),
            ..RawInputs::default()
        };
        let settings = build(raw).expect("settings");
        assert_eq!(settings.repository_url(), "https://ghe.example.com/octo/repo");
        assert_eq!(settings.auth_config_key(), "http.https://ghe.example.com/.extraheader");
    }
}
