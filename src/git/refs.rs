//! Ref resolution: which refspec to fetch and what to check out afterwards

use once_cell::sync::Lazy;
use regex::Regex;

use super::commands::GitCommands;
use super::error::GitError;
use crate::domain::CheckoutInfo;

static COMMIT_SHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("valid sha regex"));

const HEADS_PREFIX: &str = "refs/heads/";
const PULL_PREFIX: &str = "refs/pull/";
const TAGS_PREFIX: &str = "refs/tags/";
const REFS_PREFIX: &str = "refs/";

pub fn is_commit_sha(value: &str) -> bool {
    COMMIT_SHA.is_match(value)
}

/// A bare 40-hex ref names a commit, not a branch.
pub fn normalize_ref(git_ref: &str, commit: &str) -> (String, String) {
    if commit.is_empty() && is_commit_sha(git_ref) {
        (String::new(), git_ref.to_string())
    } else {
        (git_ref.to_string(), commit.to_string())
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    strip_prefix_ignore_case(value, prefix).is_some()
}

/// Refspec(s) to pass to `fetch` for the desired ref and/or commit.
pub fn get_ref_spec(git_ref: &str, commit: &str) -> Result<Vec<String>, GitError> {
    let (git_ref, commit) = normalize_ref(git_ref, commit);
    if git_ref.is_empty() && commit.is_empty() {
        return Err(GitError::InvalidRef("Args ref and commit cannot both be empty".to_string()));
    }

    if !commit.is_empty() {
        let spec = if let Some(branch) = strip_prefix_ignore_case(&git_ref, HEADS_PREFIX) {
            format!("+{commit}:refs/remotes/origin/{branch}")
        } else if let Some(pull) = strip_prefix_ignore_case(&git_ref, PULL_PREFIX) {
            format!("+{commit}:refs/remotes/pull/{pull}")
        } else if has_prefix_ignore_case(&git_ref, TAGS_PREFIX) {
            format!("+{commit}:{git_ref}")
        } else {
            commit.clone()
        };
        return Ok(vec![spec]);
    }

    if !has_prefix_ignore_case(&git_ref, REFS_PREFIX) {
        return Ok(vec![
            format!("+refs/heads/{git_ref}*:refs/remotes/origin/{git_ref}*"),
            format!("+refs/tags/{git_ref}*:refs/tags/{git_ref}*"),
        ]);
    }

    let spec = if let Some(branch) = strip_prefix_ignore_case(&git_ref, HEADS_PREFIX) {
        format!("+{git_ref}:refs/remotes/origin/{branch}")
    } else if let Some(pull) = strip_prefix_ignore_case(&git_ref, PULL_PREFIX) {
        format!("+{git_ref}:refs/remotes/pull/{pull}")
    } else {
        format!("+{git_ref}:{git_ref}")
    };
    Ok(vec![spec])
}

/// Concrete checkout target, querying the fetched refs for unqualified names.
pub fn get_checkout_info<G: GitCommands + ?Sized>(
    git: &G,
    git_ref: &str,
    commit: &str,
) -> Result<CheckoutInfo, GitError> {
    let (git_ref, commit) = normalize_ref(git_ref, commit);
    if git_ref.is_empty() && commit.is_empty() {
        return Err(GitError::InvalidRef("Args ref and commit cannot both be empty".to_string()));
    }

    if git_ref.is_empty() {
        return Ok(CheckoutInfo { git_ref: commit, start_point: None });
    }

    if let Some(branch) = strip_prefix_ignore_case(&git_ref, HEADS_PREFIX) {
        return Ok(CheckoutInfo {
            git_ref: branch.to_string(),
            start_point: Some(format!("refs/remotes/origin/{branch}")),
        });
    }

    if let Some(pull) = strip_prefix_ignore_case(&git_ref, PULL_PREFIX) {
        return Ok(CheckoutInfo { git_ref: format!("refs/remotes/pull/{pull}"), start_point: None });
    }

    if has_prefix_ignore_case(&git_ref, REFS_PREFIX) {
        return Ok(CheckoutInfo { git_ref, start_point: None });
    }

    if git.branch_exists(true, &format!("origin/{git_ref}"))? {
        let start_point = Some(format!("refs/remotes/origin/{git_ref}"));
        return Ok(CheckoutInfo { git_ref, start_point });
    }

    if git.tag_exists(&git_ref)? {
        return Ok(CheckoutInfo { git_ref: format!("refs/tags/{git_ref}"), start_point: None });
    }

    Err(GitError::InvalidRef(format!("A branch or tag with the name '{git_ref}' could not be found")))
}
