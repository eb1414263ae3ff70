//! Process-backed git command interface

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::commands::{GitCommands, GitProvider};
use super::error::GitError;
use super::version::{GitVersion, MINIMUM_GIT_LFS_VERSION, MINIMUM_GIT_VERSION};

static CONFIG_KEY_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("valid config key regex"));

/// Opens [`GitCli`] instances after checking the installed tool versions.
#[derive(Debug, Clone)]
pub struct GitCliProvider {
    git_path: PathBuf,
}

impl GitCliProvider {
    pub fn new() -> Self {
        Self { git_path: PathBuf::from("git") }
    }

    pub fn with_git_path(git_path: impl Into<PathBuf>) -> Self {
        Self { git_path: git_path.into() }
    }
}

impl Default for GitCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GitProvider for GitCliProvider {
    type Git = GitCli;

    fn open(&self, working_directory: &Path, lfs: bool) -> Result<GitCli, GitError> {
        if !working_directory.is_dir() {
            return Err(GitError::MissingWorkingDirectory(working_directory.to_path_buf()));
        }
        let git = GitCli {
            git_path: self.git_path.clone(),
            working_directory: working_directory.to_path_buf(),
            lfs,
        };
        git.check_versions()?;
        Ok(git)
    }
}

struct GitOutput {
    exit_code: i32,
    stdout: String,
}

/// Runs `git` in a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_path: PathBuf,
    working_directory: PathBuf,
    lfs: bool,
}

impl GitCli {
    fn check_versions(&self) -> Result<(), GitError> {
        let output = self.exec(&["--version"], false)?;
        let found = GitVersion::parse(&output.stdout)
            .ok_or(GitError::UnparsableVersion { tool: "git", output: output.stdout.clone() })?;
        if found < MINIMUM_GIT_VERSION {
            return Err(GitError::UnsupportedVersion {
                tool: "git",
                minimum: MINIMUM_GIT_VERSION,
                found,
            });
        }
        debug!(version = %found, "git version");

        if self.lfs {
            let output = self.exec(&["lfs", "version"], false)?;
            let found = GitVersion::parse(&output.stdout).ok_or(GitError::UnparsableVersion {
                tool: "git-lfs",
                output: output.stdout.clone(),
            })?;
            if found < MINIMUM_GIT_LFS_VERSION {
                return Err(GitError::UnsupportedVersion {
                    tool: "git-lfs",
                    minimum: MINIMUM_GIT_LFS_VERSION,
                    found,
                });
            }
            debug!(version = %found, "git-lfs version");
        }
        Ok(())
    }

    fn exec(&self, args: &[&str], allow_all_exit_codes: bool) -> Result<GitOutput, GitError> {
        let rendered = args.join(" ");
        debug!(command = %format!("git {rendered}"), cwd = %self.working_directory.display());

        let mut cmd = Command::new(&self.git_path);
        cmd.args(args)
            .current_dir(&self.working_directory)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "Never");
        if self.lfs {
            cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        }

        let output = cmd.output().map_err(|source| GitError::Spawn {
            program: self.git_path.display().to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}", line);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 && !allow_all_exit_codes {
            return Err(GitError::CommandFailed {
                args: rendered,
                code: exit_code,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(GitOutput { exit_code, stdout })
    }

    fn succeeds(&self, args: &[&str]) -> bool {
        matches!(self.exec(args, true), Ok(output) if output.exit_code == 0)
    }

    fn shallow_file(&self) -> PathBuf {
        self.working_directory.join(".git").join("shallow")
    }
}

/// Escape every character `git config --get-regexp` would treat specially.
fn config_key_pattern(key: &str) -> String {
    CONFIG_KEY_SPECIAL.replace_all(key, r"\$0").into_owned()
}

/// Strip the `refs/heads/` or `refs/remotes/` prefix `rev-parse --symbolic` may print.
fn short_branch_name(line: &str) -> &str {
    line.strip_prefix("refs/heads/").or_else(|| line.strip_prefix("refs/remotes/")).unwrap_or(line)
}

impl GitCommands for GitCli {
    fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    fn init(&self) -> Result<(), GitError> {
        let dir = self.working_directory.to_string_lossy().into_owned();
        self.exec(&["init", &dir], false).map(|_| ())
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.exec(&["remote", "add", name, url], false).map(|_| ())
    }

    fn try_disable_automatic_gc(&self) -> bool {
        self.succeeds(&["config", "--local", "gc.auto", "0"])
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.exec(&["config", "--local", key, value], false).map(|_| ())
    }

    fn config_exists(&self, key: &str) -> Result<bool, GitError> {
        let pattern = config_key_pattern(key);
        let output =
            self.exec(&["config", "--local", "--name-only", "--get-regexp", &pattern], true)?;
        Ok(output.exit_code == 0)
    }

    fn try_config_unset(&self, key: &str) -> bool {
        self.succeeds(&["config", "--local", "--unset-all", key])
    }

    fn fetch(&self, depth: u32, refspec: &[String]) -> Result<(), GitError> {
        let depth_arg = format!("--depth={depth}");
        let mut args = vec![
            "-c",
            "protocol.version=2",
            "fetch",
            "--no-tags",
            "--prune",
            "--progress",
            "--no-recurse-submodules",
        ];
        if depth > 0 {
            args.push(&depth_arg);
        } else if self.shallow_file().exists() {
            args.push("--unshallow");
        }
        args.push("origin");
        args.extend(refspec.iter().map(String::as_str));
        self.exec(&args, false).map(|_| ())
    }

    fn lfs_install(&self) -> Result<(), GitError> {
        self.exec(&["lfs", "install", "--local"], false).map(|_| ())
    }

    fn lfs_fetch(&self, git_ref: &str) -> Result<(), GitError> {
        self.exec(&["lfs", "fetch", "origin", git_ref], false).map(|_| ())
    }

    fn checkout(&self, git_ref: &str, start_point: Option<&str>) -> Result<(), GitError> {
        let mut args = vec!["checkout", "--progress", "--force"];
        match start_point {
            Some(start) => args.extend(["-B", git_ref, start]),
            None => args.push(git_ref),
        }
        self.exec(&args, false).map(|_| ())
    }

    fn checkout_detach(&self) -> Result<(), GitError> {
        self.exec(&["checkout", "--detach"], false).map(|_| ())
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        // `branch --show-current` needs git 2.22; rev-parse works from the 2.18 floor.
        let output =
            self.exec(&["rev-parse", "--symbolic-full-name", "--verify", "--quiet", "HEAD"], true)?;
        Ok(!output.stdout.trim().starts_with("refs/heads/"))
    }

    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError> {
        let scope = if remote { "--remotes=origin" } else { "--branches" };
        let output = self.exec(&["rev-parse", "--symbolic", scope], false)?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| short_branch_name(line).to_string())
            .collect())
    }

    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError> {
        let mut args = vec!["branch", "--delete", "--force"];
        if remote {
            args.push("--remote");
        }
        args.push(name);
        self.exec(&args, false).map(|_| ())
    }

    fn branch_exists(&self, remote: bool, pattern: &str) -> Result<bool, GitError> {
        let mut args = vec!["branch", "--list"];
        if remote {
            args.push("--remote");
        }
        args.push(pattern);
        let output = self.exec(&args, false)?;
        Ok(!output.stdout.trim().is_empty())
    }

    fn tag_exists(&self, pattern: &str) -> Result<bool, GitError> {
        let output = self.exec(&["tag", "--list", pattern], false)?;
        Ok(!output.stdout.trim().is_empty())
    }

    fn try_clean(&self) -> bool {
        self.succeeds(&["clean", "-ffdx"])
    }

    fn try_reset(&self) -> bool {
        self.succeeds(&["reset", "--hard", "HEAD"])
    }

    fn try_get_fetch_url(&self) -> String {
        let Ok(output) = self.exec(&["config", "--local", "--get", "remote.origin.url"], true)
        else {
            return String::new();
        };
        if output.exit_code != 0 {
            return String::new();
        }
        let url = output.stdout.trim();
        // Multiple values mean the remote was configured by hand; treat as unknown.
        if url.contains('\n') {
            return String::new();
        }
        url.to_string()
    }

    fn log1(&self) -> Result<String, GitError> {
        let output = self.exec(&["log", "-1", "--format=%H %s"], false)?;
        Ok(output.stdout.trim().to_string())
    }
}
