//! source-sync: reconcile a pipeline working directory with a ref of a remote repository
//!
//! The [`sync::SourceSynchronizer`] drives an external `git` through the
//! [`git::GitCommands`] interface: it reuses or recreates the working
//! directory, installs a short-lived auth header, fetches and checks out the
//! requested ref, and removes the header again on cleanup.

pub mod cli;
pub mod config;
pub mod domain;
pub mod git;
pub mod redact;
pub mod sync;
pub mod utils;
