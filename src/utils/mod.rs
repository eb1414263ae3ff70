//! Small shared helpers

pub mod fs;
pub mod hashing;
pub mod paths;

pub use hashing::stable_key;
pub use paths::normalize_lexically;
