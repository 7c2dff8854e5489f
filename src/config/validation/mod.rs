//! Configuration validation
//!
//! - `trait_def`: the `Validate` trait
//! - `backend_validators`: per-backend rules
//! - `config_validators`: cache, rate limit, retry, health and the top-level config
//! - `tests`: test suite for all validators

mod backend_validators;
mod config_validators;
mod trait_def;

pub use trait_def::Validate;
