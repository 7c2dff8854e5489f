//! Custom test assertions

use llm_dispatch::{CompletionResponse, DispatchError};

/// Assertions for CompletionResponse
pub trait CompletionResponseAssertions {
    /// Assert the response came from `backend` after `attempts` attempts
    fn assert_served_by(&self, backend: &str, attempts: u32);

    /// Assert the response came from the cache
    fn assert_cached(&self);
}

impl CompletionResponseAssertions for CompletionResponse {
    fn assert_served_by(&self, backend: &str, attempts: u32) {
        assert!(!self.cached, "expected a fresh response, got a cached one");
        assert_eq!(self.backend_used.as_deref(), Some(backend));
        assert_eq!(self.attempts, attempts, "unexpected attempt count");
    }

    fn assert_cached(&self) {
        assert!(self.cached, "expected a cached response");
        assert_eq!(self.backend_used, None);
        assert_eq!(self.attempts, 0);
    }
}

/// Names of the backends recorded in an aggregated failure, in order
pub fn failed_backends(error: &DispatchError) -> Vec<String> {
    error.failures().iter().map(|f| f.backend.clone()).collect()
}

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-6_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` (epsilon: `{:?}`)",
            left_val,
            right_val,
            diff,
            $epsilon
        );
    };
}
