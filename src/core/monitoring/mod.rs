//! Attempt-level performance monitoring
//!
//! Every backend attempt and every cache hit is recorded as an
//! [`AttemptRecord`]. Recording only pushes onto a lock-free queue; records are
//! folded into per-backend aggregates when someone reads them.

pub mod monitor;
pub mod types;


pub use monitor::PerformanceMonitor;
pub use types::{AttemptOutcome, AttemptRecord, BackendPerformance, MonitorSummary};
