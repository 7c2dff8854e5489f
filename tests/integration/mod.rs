//! Integration tests
//!
//! Exercise the dispatcher end to end with scripted backends, and the HTTP
//! adapters against mock servers.

mod cache_tests;
mod config_loading_tests;
mod health_tests;
