//! The dispatch entry point
//!
//! [`Dispatcher`] ties the registry, cache, rate limiter, health tracking,
//! load balancer, retry executor and performance monitor together behind
//! [`Dispatcher::complete`].

mod complete_impl;
pub mod dispatcher;
pub mod registry;
pub mod status;


pub use dispatcher::Dispatcher;
pub use registry::BackendRegistry;
pub use status::{BackendStatus, ProbeResult};
