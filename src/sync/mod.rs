//! Working-directory synchronization: reconcile, authenticate, fetch, check out

pub mod auth;
pub mod error;
pub mod reconcile;
pub mod state;
pub mod synchronizer;

pub use auth::{AuthHeaderManager, RemovalOutcome};
pub use error::{SyncError, SyncPhase};
pub use reconcile::{try_reconcile, ReconcileOutcome, RefusalReason};
pub use state::{default_state_dir, JobState, JobStateStore};
pub use synchronizer::{CleanupOutcome, SourceSynchronizer, SyncReport};
