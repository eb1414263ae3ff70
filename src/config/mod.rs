//! Configuration loading and normalization
//!
//! Inputs are layered from defaults, a config file, `SOURCE_SYNC_*`
//! environment variables and CLI arguments (CLI > Env > File > Defaults),
//! then normalized against the job context into [`SyncSettings`](crate::domain::SyncSettings).

pub mod context;
pub mod inputs;
pub mod loader;
pub mod merge;

pub use context::JobContext;
pub use inputs::{build_settings, resolve_workspace, InputValue, RawInputs};
pub use loader::{load_inputs, ENV_PREFIX};
pub use merge::{merge_cli_with_config, CliOverrides};
