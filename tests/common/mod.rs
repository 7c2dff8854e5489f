//! Common test utilities for llm-dispatch
//!
//! ```rust,ignore
//! use crate::common::{backends::ScriptedBackend, fixtures};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let alpha = ScriptedBackend::echo("alpha");
//!     let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod backends;
pub mod fixtures;

pub use backends::{ScriptedBackend, Step};

/// Skip test if environment variable is not set
#[macro_export]
macro_rules! skip_without_env {
    ($var:expr) => {
        if std::env::var($var).is_err() {
            eprintln!("Skipping test: {} environment variable not set", $var);
            return;
        }
    };
}
