//! Shared helpers used across all mirrorplane crates.

pub mod id;
pub mod redact;
pub mod time;
