//! Tool version parsing for the minimum-version gate

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const MINIMUM_GIT_VERSION: GitVersion = GitVersion::new(2, 18, 0);
pub const MINIMUM_GIT_LFS_VERSION: GitVersion = GitVersion::new(2, 1, 0);

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse the first `major.minor[.patch]` in tool output such as
    /// `git version 2.39.2 (Apple Git-143)` or `git-lfs/3.4.0 (GitHub; linux amd64)`.
    pub fn parse(output: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(output)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor, patch })
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_git_version_banner() {
        let v = GitVersion::parse("git version 2.39.2 (Apple Git-143)").expect("version");
        assert_eq!(v, GitVersion::new(2, 39, 2));
    }

    #[test]
    fn parses_lfs_banner() {
        let v = GitVersion::parse("git-lfs/3.4.0 (GitHub; linux amd64; go 1.21.1)").expect("version");
        assert_eq!(v, GitVersion::new(3, 4, 0));
    }

    #[test]
    fn missing_patch_defaults_to_zero() {
        assert_eq!(GitVersion::parse("git version 2.18"), Some(GitVersion::new(2, 18, 0)));
    }

    #[test]
    fn rejects_output_without_version() {
        assert_eq!(GitVersion::parse("command not found"), None);
    }

    #[test]
    fn ordering_compares_components_numerically() {
        assert!(GitVersion::new(2, 9, 0) < MINIMUM_GIT_VERSION);
        assert!(GitVersion::new(2, 18, 0) >= MINIMUM_GIT_VERSION);
        assert!(GitVersion::new(10, 0, 0) > MINIMUM_GIT_VERSION);
    }
}
