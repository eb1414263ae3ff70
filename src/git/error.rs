//! Errors raised by the git command interface

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::version::GitVersion;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("unable to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("git {args} failed with exit code {code}: {stderr}")]
    CommandFailed { args: String, code: i32, stderr: String },

    #[error("unable to parse {tool} version from '{output}'")]
    UnparsableVersion { tool: &'static str, output: String },

    #[error("minimum required {tool} version is {minimum}, found {found}")]
    UnsupportedVersion { tool: &'static str, minimum: GitVersion, found: GitVersion },

    #[error("{0}")]
    InvalidRef(String),

    #[error("working directory '{}' does not exist", .0.display())]
    MissingWorkingDirectory(PathBuf),
}
