//! Command-line interface for source-sync
//!
//! Provides `sync` and `cleanup` subcommands, meant to run as the first and
//! last step of one pipeline job.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::redact::{MaskingMakeWriter, SecretMasker};

mod cleanup;
mod sync;

/// Reconcile a pipeline working directory with a ref of a remote repository
#[derive(Parser)]
#[command(name = "source-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and check out the requested ref into the working directory
    Sync(Box<sync::SyncArgs>),

    /// Remove the auth header left behind by an earlier `sync` in this job
    Cleanup(cleanup::CleanupArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let masker = SecretMasker::from_env();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(MaskingMakeWriter::new(std::io::stderr, masker.clone())),
        )
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Sync(args) => sync::run(*args, masker.clone()),
        Commands::Cleanup(args) => cleanup::run(args, masker.clone()),
    };
    // The error chain can quote git's stderr; it bypasses the log writer.
    result.map_err(|e| anyhow!(masker.mask(&format!("{e:#}"))))
}
