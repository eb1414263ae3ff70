//! Secret masking for log output

pub mod masker;
pub mod rules;
pub mod writer;

pub use masker::{SecretMasker, MASK};
pub use writer::{MaskingMakeWriter, MaskingWriter};
