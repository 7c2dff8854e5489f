//! Response cache behaviour through the dispatcher

use crate::common::assertions::CompletionResponseAssertions;
use crate::common::{ScriptedBackend, fixtures};
use std::time::Duration;

#[tokio::test]
async fn test_identical_request_served_from_cache() {
    let alpha = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    let first = dispatcher.complete(fixtures::request("hello")).await.unwrap();
    first.assert_served_by("alpha", 1);
    assert_eq!(first.text, "alpha: hello");

    let second = dispatcher.complete(fixtures::request("hello")).await.unwrap();
    second.assert_cached();
    assert_eq!(second.text, first.text);
    assert_eq!(alpha.calls(), 1);

    let stats = dispatcher.get_cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(dispatcher.monitor_summary().cache_hits, 1);
}

#[tokio::test]
async fn test_prompt_whitespace_does_not_split_cache() {
    let alpha = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();
    let again = dispatcher
        .complete(fixtures::request("  hello \n"))
        .await
        .unwrap();

    again.assert_cached();
    assert_eq!(alpha.calls(), 1);
}

#[tokio::test]
async fn test_different_parameters_are_cached_separately() {
    let alpha = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();
    let warmer = dispatcher
        .complete(fixtures::request("hello").with_temperature(1.2))
        .await
        .unwrap();
    let with_system = dispatcher
        .complete(fixtures::request("hello").with_system("Be brief"))
        .await
        .unwrap();
    let other_model = dispatcher
        .complete(fixtures::request("hello").with_model("other-model"))
        .await
        .unwrap();

    assert!(!warmer.cached);
    assert!(!with_system.cached);
    assert!(!other_model.cached);
    assert_eq!(alpha.calls(), 4);
    assert_eq!(dispatcher.get_cache_stats().entries, 4);
}

#[tokio::test]
async fn test_cache_bypass_neither_reads_nor_writes() {
    let alpha = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    dispatcher.complete(fixtures::uncached("hello")).await.unwrap();
    assert_eq!(dispatcher.get_cache_stats().entries, 0);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();
    let bypass = dispatcher.complete(fixtures::uncached("hello")).await.unwrap();
    assert!(!bypass.cached);
    assert_eq!(alpha.calls(), 3);
}

#[tokio::test]
async fn test_disabled_cache_always_calls_backend() {
    let alpha = ScriptedBackend::echo("alpha");
    let mut config = fixtures::fast_config();
    config.cache.enabled = false;
    let dispatcher = fixtures::dispatcher(config, &[alpha.clone()]);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();
    dispatcher.complete(fixtures::request("hello")).await.unwrap();

    assert_eq!(alpha.calls(), 2);
    assert_eq!(dispatcher.get_cache_stats().hits, 0);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_refetched() {
    let alpha = ScriptedBackend::echo("alpha");
    let mut config = fixtures::fast_config();
    config.cache.default_ttl = Duration::from_secs(10);
    let dispatcher = fixtures::dispatcher(config, &[alpha.clone()]);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    dispatcher
        .complete(fixtures::request("hello"))
        .await
        .unwrap()
        .assert_cached();

    tokio::time::advance(Duration::from_secs(2)).await;
    let refreshed = dispatcher.complete(fixtures::request("hello")).await.unwrap();
    refreshed.assert_served_by("alpha", 1);
    assert_eq!(alpha.calls(), 2);
    assert_eq!(dispatcher.get_cache_stats().expirations, 1);
}

#[tokio::test]
async fn test_failed_request_is_not_cached() {
    let alpha = ScriptedBackend::unavailable("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    assert!(dispatcher.complete(fixtures::request("hello")).await.is_err());
    assert_eq!(dispatcher.get_cache_stats().entries, 0);
}

#[tokio::test]
async fn test_lru_bound_respected_through_dispatcher() {
    let alpha = ScriptedBackend::echo("alpha");
    let mut config = fixtures::fast_config();
    config.cache.max_entries = 3;
    let dispatcher = fixtures::dispatcher(config, &[alpha.clone()]);

    for prompt in ["a", "b", "c"] {
        dispatcher.complete(fixtures::request(prompt)).await.unwrap();
    }
    // Touch "a" so "b" becomes least recently used
    dispatcher
        .complete(fixtures::request("a"))
        .await
        .unwrap()
        .assert_cached();
    dispatcher.complete(fixtures::request("d")).await.unwrap();

    let stats = dispatcher.get_cache_stats();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.evictions, 1);

    let b = dispatcher.complete(fixtures::request("b")).await.unwrap();
    assert!(!b.cached);
    let a = dispatcher.complete(fixtures::request("a")).await.unwrap();
    assert!(a.cached);
}

#[tokio::test]
async fn test_clear_cache() {
    let alpha = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(fixtures::fast_config(), &[alpha.clone()]);

    dispatcher.complete(fixtures::request("hello")).await.unwrap();
    dispatcher.clear_cache();

    assert_eq!(dispatcher.get_cache_stats().entries, 0);
    let again = dispatcher.complete(fixtures::request("hello")).await.unwrap();
    assert!(!again.cached);
    assert_eq!(alpha.calls(), 2);
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixtures::fast_config();
    config.cache.persist_path = Some(dir.path().join("cache.json"));

    let first_backend = ScriptedBackend::echo("alpha");
    {
        let dispatcher = fixtures::dispatcher(config.clone(), &[first_backend.clone()]);
        dispatcher.complete(fixtures::request("remember me")).await.unwrap();
        dispatcher.flush().await;
    }

    let second_backend = ScriptedBackend::echo("alpha");
    let dispatcher = fixtures::dispatcher(config, &[second_backend.clone()]);
    let response = dispatcher
        .complete(fixtures::request("remember me"))
        .await
        .unwrap();

    response.assert_cached();
    assert_eq!(response.text, "alpha: remember me");
    assert_eq!(second_backend.calls(), 0);
}
