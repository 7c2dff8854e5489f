//! Health transitions driven by real traffic

use crate::common::{ScriptedBackend, Step, fixtures};
use llm_dispatch::{Dispatcher, HealthStatus, ProviderError};
use std::time::Duration;

fn health(dispatcher: &Dispatcher, name: &str) -> HealthStatus {
    dispatcher
        .get_backend_status()
        .into_iter()
        .find(|s| s.name == name)
        .map(|s| s.health)
        .expect("backend status")
}

fn dispatcher_with_threshold(threshold: u32, backends: &[std::sync::Arc<ScriptedBackend>]) -> Dispatcher {
    let mut config = fixtures::fast_config();
    config.health.failure_threshold = threshold;
    config.health.probe_interval = Duration::from_secs(30);
    fixtures::dispatcher(config, backends)
}

#[tokio::test(start_paused = true)]
async fn test_repeated_failures_make_backend_unhealthy() {
    let alpha = ScriptedBackend::failing("alpha", ProviderError::authentication("alpha", "revoked"));
    let beta = ScriptedBackend::echo("beta");
    let dispatcher = dispatcher_with_threshold(3, &[alpha.clone(), beta.clone()]);

    // Round-robin alternates, so alpha is selected on every other request
    for i in 0..6 {
        dispatcher
            .complete(fixtures::uncached(&format!("req {}", i)))
            .await
            .unwrap();
    }

    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Unhealthy);
    assert_eq!(health(&dispatcher, "beta"), HealthStatus::Healthy);
    let alpha_calls = alpha.calls();

    for i in 0..5 {
        let response = dispatcher
            .complete(fixtures::uncached(&format!("later {}", i)))
            .await
            .unwrap();
        assert_eq!(response.backend_used.as_deref(), Some("beta"));
    }
    assert_eq!(alpha.calls(), alpha_calls);
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_backend_probed_and_recovers() {
    let alpha = ScriptedBackend::failing("alpha", ProviderError::authentication("alpha", "revoked"));
    let beta = ScriptedBackend::echo("beta");
    let dispatcher = dispatcher_with_threshold(1, &[alpha.clone(), beta.clone()]);

    dispatcher.complete(fixtures::uncached("first")).await.unwrap();
    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Unhealthy);

    alpha.set_fallback(Step::Echo);
    dispatcher.complete(fixtures::uncached("second")).await.unwrap();
    assert_eq!(alpha.calls(), 1, "probe must wait for the probe interval");

    tokio::time::advance(Duration::from_secs(30)).await;
    let probed = dispatcher.complete(fixtures::uncached("third")).await.unwrap();

    assert_eq!(probed.backend_used.as_deref(), Some("alpha"));
    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Healthy);
}

#[tokio::test(start_paused = true)]
async fn test_failed_probe_waits_another_interval() {
    let alpha = ScriptedBackend::unavailable("alpha");
    let beta = ScriptedBackend::echo("beta");
    let dispatcher = dispatcher_with_threshold(1, &[alpha.clone(), beta.clone()]);

    dispatcher.complete(fixtures::uncached("one")).await.unwrap();
    assert_eq!(alpha.calls(), 3);

    tokio::time::advance(Duration::from_secs(30)).await;
    dispatcher.complete(fixtures::uncached("two")).await.unwrap();
    assert_eq!(alpha.calls(), 6);
    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Unhealthy);

    tokio::time::advance(Duration::from_secs(10)).await;
    dispatcher.complete(fixtures::uncached("three")).await.unwrap();
    assert_eq!(alpha.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_all_unhealthy_still_attempts_a_backend() {
    let alpha = ScriptedBackend::unavailable("alpha");
    let dispatcher = dispatcher_with_threshold(1, &[alpha.clone()]);

    assert!(dispatcher.complete(fixtures::uncached("one")).await.is_err());
    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Unhealthy);

    alpha.set_fallback(Step::Echo);
    let response = dispatcher.complete(fixtures::uncached("two")).await.unwrap();

    assert_eq!(response.backend_used.as_deref(), Some("alpha"));
    assert_eq!(health(&dispatcher, "alpha"), HealthStatus::Healthy);
}

#[tokio::test]
async fn test_success_resets_consecutive_failures() {
    let alpha = ScriptedBackend::echo("alpha");
    alpha.push_steps([Step::Fail(ProviderError::authentication("alpha", "flaky auth"))]);
    let dispatcher = dispatcher_with_threshold(3, &[alpha.clone()]);

    assert!(dispatcher.complete(fixtures::uncached("one")).await.is_err());
    let status = &dispatcher.get_backend_status()[0];
    assert_eq!(status.health, HealthStatus::Degraded);
    assert_eq!(status.consecutive_failures, 1);

    dispatcher.complete(fixtures::uncached("two")).await.unwrap();
    let status = &dispatcher.get_backend_status()[0];
    assert_eq!(status.health, HealthStatus::Healthy);
    assert_eq!(status.consecutive_failures, 0);
    crate::assert_approx_eq!(status.success_rate.unwrap(), 0.5);
}
