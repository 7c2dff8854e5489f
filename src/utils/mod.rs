//! Shared utilities: error types, logging setup and serde helpers

pub mod error;
pub mod logging;
pub mod serde_duration;
