//! source-sync: reconcile a pipeline working directory with a ref of a remote repository

use anyhow::Result;

fn main() -> Result<()> {
    source_sync::cli::run()
}
