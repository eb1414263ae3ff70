//! Git orchestration: the command interface, its process-backed
//! implementation and ref resolution.

pub mod cli;
pub mod commands;
pub mod error;
pub mod refs;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::{GitCli, GitCliProvider};
pub use commands::{GitCommands, GitProvider};
pub use error::GitError;
pub use version::GitVersion;
