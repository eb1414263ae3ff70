//! Core data types shared by the synchronizer and its collaborators

pub mod settings;

pub use settings::{auth_config_key, CheckoutInfo, SyncSettings, DEFAULT_SERVER_URL};
