//! Retry execution with exponential backoff
//!
//! [`RetryExecutor`] drives attempts against a single backend. It never
//! switches backends; falling back is the dispatcher's job.

pub mod backoff;
pub mod executor;


pub use backoff::Backoff;
pub use executor::{Execution, RetryExecutor};
