//! Backend routing: health tracking and weighted selection

pub mod health;
pub mod load_balancer;


pub use health::{BackendHealthState, HealthStatus, HealthTracker};
pub use load_balancer::{LoadBalancer, Selection, WeightedBackend};
