//! In-memory git double for unit tests.
//!
//! Refs, HEAD and call history live in memory; `.git/config` is a real file
//! (one `key = value` entry per line) so config rewrites can be observed.

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use super::commands::{GitCommands, GitProvider};
use super::error::GitError;

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub local_branches: BTreeSet<String>,
    pub remote_branches: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    /// Branch and tag names the fake remote serves.
    pub upstream_branches: BTreeSet<String>,
    pub upstream_tags: BTreeSet<String>,
    pub upstream_commits: BTreeMap<String, String>,
    pub detached: bool,
    pub head: Option<String>,
    /// Operation names forced to fail: open, init, fetch, checkout, detach,
    /// branch_delete, unset, clean, reset, gc, lfs.
    pub failing: BTreeSet<&'static str>,
}

impl FakeState {
    pub fn fail(&mut self, op: &'static str) {
        self.failing.insert(op);
    }

    fn check(&self, op: &'static str) -> Result<(), GitError> {
        if self.failing.contains(op) {
            return Err(GitError::CommandFailed {
                args: op.to_string(),
                code: 1,
                stderr: "forced failure".to_string(),
            });
        }
        Ok(())
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls.iter().filter(|c| c.starts_with(prefix)).cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct FakeGit {
    dir: PathBuf,
    state: Rc<RefCell<FakeState>>,
}

/// A [`FakeGit`] bound to its own temp dir with an initialized `.git`.
pub struct FakeGitFixture {
    _tmp: TempDir,
    git: FakeGit,
}

impl Deref for FakeGitFixture {
    type Target = FakeGit;

    fn deref(&self) -> &FakeGit {
        &self.git
    }
}

impl AsRef<FakeGit> for FakeGitFixture {
    fn as_ref(&self) -> &FakeGit {
        &self.git
    }
}

impl FakeGit {
    pub fn new(dir: &Path, state: Rc<RefCell<FakeState>>) -> Self {
        Self { dir: dir.to_path_buf(), state }
    }

    pub fn detached_in_temp() -> FakeGitFixture {
        let tmp = TempDir::new().expect("tmp");
        let git = FakeGit::new(tmp.path(), Rc::new(RefCell::new(FakeState::default())));
        git.init().expect("init");
        git.state().detached = true;
        FakeGitFixture { _tmp: tmp, git }
    }

    pub fn state(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(".git").join("config")
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn append_config(&self, key: &str, value: &str) {
        let mut content = fs::read_to_string(self.config_path()).unwrap_or_default();
        content.push_str(&format!("\t{key} = {value}\n"));
        fs::write(self.config_path(), content).expect("write config");
    }

    fn config_lines(&self) -> Vec<String> {
        fs::read_to_string(self.config_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn config_get(&self, key: &str) -> Option<String> {
        let prefix = format!("{key} = ").to_ascii_lowercase();
        self.config_lines().into_iter().find_map(|line| {
            let trimmed = line.trim_start();
            if trimmed.to_ascii_lowercase().starts_with(&prefix) {
                Some(trimmed[prefix.len()..].to_string())
            } else {
                None
            }
        })
    }

    fn apply_refspec(&self, spec: &str) {
        let spec = spec.trim_start_matches('+');
        let Some((_, dest)) = spec.split_once(':') else {
            return;
        };
        let mut state = self.state();
        if let Some(prefix) = dest.strip_prefix("refs/remotes/origin/") {
            match prefix.strip_suffix('*') {
                Some(stem) => {
                    let matched: Vec<String> = state
                        .upstream_branches
                        .iter()
                        .filter(|b| b.starts_with(stem))
                        .map(|b| format!("origin/{b}"))
                        .collect();
                    state.remote_branches.extend(matched);
                }
                None => {
                    state.remote_branches.insert(format!("origin/{prefix}"));
                }
            }
        } else if let Some(rest) = dest.strip_prefix("refs/remotes/") {
            state.remote_branches.insert(rest.to_string());
        } else if let Some(tag) = dest.strip_prefix("refs/tags/") {
            match tag.strip_suffix('*') {
                Some(stem) => {
                    let matched: Vec<String> =
                        state.upstream_tags.iter().filter(|t| t.starts_with(stem)).cloned().collect();
                    state.tags.extend(matched);
                }
                None => {
                    state.tags.insert(tag.to_string());
                }
            }
        }
    }
}

impl GitCommands for FakeGit {
    fn working_directory(&self) -> &Path {
        &self.dir
    }

    fn init(&self) -> Result<(), GitError> {
        self.record("init".to_string());
        self.state().check("init")?;
        fs::create_dir_all(self.dir.join(".git")).expect("create .git");
        fs::write(self.config_path(), "[core]\n").expect("write config");
        Ok(())
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.record(format!("remote_add {name} {url}"));
        self.append_config(&format!("remote.{name}.url"), url);
        Ok(())
    }

    fn try_disable_automatic_gc(&self) -> bool {
        self.record("disable_gc".to_string());
        self.state().check("gc").is_ok()
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.record(format!("config_set {key} {value}"));
        self.append_config(key, value);
        Ok(())
    }

    fn config_exists(&self, key: &str) -> Result<bool, GitError> {
        Ok(self.config_get(key).is_some())
    }

    fn try_config_unset(&self, key: &str) -> bool {
        self.record(format!("config_unset {key}"));
        if self.state().check("unset").is_err() {
            return false;
        }
        let prefix = format!("{key} = ").to_ascii_lowercase();
        let kept: Vec<String> = self
            .config_lines()
            .into_iter()
            .filter(|l| !l.trim_start().to_ascii_lowercase().starts_with(&prefix))
            .collect();
        fs::write(self.config_path(), format!("{}\n", kept.join("\n"))).expect("write config");
        true
    }

    fn fetch(&self, depth: u32, refspec: &[String]) -> Result<(), GitError> {
        self.record(format!("fetch depth={depth} {}", refspec.join(" ")));
        self.state().check("fetch")?;
        for spec in refspec {
            self.apply_refspec(spec);
        }
        Ok(())
    }

    fn lfs_install(&self) -> Result<(), GitError> {
        self.record("lfs_install".to_string());
        self.state().check("lfs")
    }

    fn lfs_fetch(&self, git_ref: &str) -> Result<(), GitError> {
        self.record(format!("lfs_fetch {git_ref}"));
        self.state().check("lfs")
    }

    fn checkout(&self, git_ref: &str, start_point: Option<&str>) -> Result<(), GitError> {
        self.record(match start_point {
            Some(start) => format!("checkout {git_ref} {start}"),
            None => format!("checkout {git_ref}"),
        });
        let mut state = self.state();
        state.check("checkout")?;
        match start_point {
            Some(_) => {
                state.local_branches.insert(git_ref.to_string());
                state.detached = false;
            }
            None => {
                state.detached = !state.local_branches.contains(git_ref);
            }
        }
        let commit = state.upstream_commits.get(git_ref).cloned();
        state.head = Some(commit.unwrap_or_else(|| git_ref.to_string()));
        Ok(())
    }

    fn checkout_detach(&self) -> Result<(), GitError> {
        self.record("checkout_detach".to_string());
        let mut state = self.state();
        state.check("detach")?;
        state.detached = true;
        Ok(())
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        Ok(self.state().detached)
    }

    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError> {
        let state = self.state();
        let set = if remote { &state.remote_branches } else { &state.local_branches };
        let names: Vec<String> = set.iter().cloned().collect();
        Ok(names)
    }

    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError> {
        self.record(format!("branch_delete remote={remote} {name}"));
        let mut state = self.state();
        state.check("branch_delete")?;
        if remote {
            state.remote_branches.remove(name);
        } else {
            if !state.detached {
                return Err(GitError::CommandFailed {
                    args: format!("branch --delete --force {name}"),
                    code: 1,
                    stderr: format!("cannot delete branch '{name}' checked out"),
                });
            }
            state.local_branches.remove(name);
        }
        Ok(())
    }

    fn branch_exists(&self, remote: bool, pattern: &str) -> Result<bool, GitError> {
        let state = self.state();
        let set = if remote { &state.remote_branches } else { &state.local_branches };
        Ok(set.contains(pattern))
    }

    fn tag_exists(&self, pattern: &str) -> Result<bool, GitError> {
        Ok(self.state().tags.contains(pattern))
    }

    fn try_clean(&self) -> bool {
        self.record("clean".to_string());
        self.state().check("clean").is_ok()
    }

    fn try_reset(&self) -> bool {
        self.record("reset".to_string());
        self.state().check("reset").is_ok()
    }

    fn try_get_fetch_url(&self) -> String {
        self.config_get("remote.origin.url").unwrap_or_default()
    }

    fn log1(&self) -> Result<String, GitError> {
        let head = self.state().head.clone().unwrap_or_default();
        Ok(format!("{head} fake commit"))
    }
}

/// Hands out [`FakeGit`]s that share one state.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeProvider {
    pub fn state(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }
}

impl GitProvider for FakeProvider {
    type Git = FakeGit;

    fn open(&self, working_directory: &Path, lfs: bool) -> Result<FakeGit, GitError> {
        self.state().calls.push(format!("open lfs={lfs}"));
        self.state().check("open")?;
        Ok(FakeGit::new(working_directory, Rc::clone(&self.state)))
    }
}
