//! Loading configuration files and building a dispatcher from them

use llm_dispatch::{BackendKind, DispatchError, Dispatcher, DispatcherConfig, HealthStatus};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const CONFIG_YAML: &str = r#"
backends:
  - name: primary
    kind: openai
    base_url: https://api.example.com/v1
    api_key: sk-test
    model: gpt-4o-mini
    weight: 3
  - name: claude
    kind: anthropic
    base_url: https://api.example.com/anthropic/v1
    api_key: sk-ant-test
    model: claude-3-5-haiku-latest
    max_retries: 2
  - name: ollama
    kind: local
    base_url: http://localhost:11434
    model: llama3
    enabled: false
cache:
  max_entries: 10
  default_ttl: 60
rate_limit:
  window: 30
health:
  failure_threshold: 2
  probe_interval: 5
default_deadline: 20
logging:
  level: debug
"#;

fn write_config(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[tokio::test]
async fn test_yaml_file_builds_dispatcher() {
    let file = write_config(CONFIG_YAML, ".yaml");
    let config = DispatcherConfig::from_file(file.path()).await.unwrap();

    assert_eq!(config.backends.len(), 3);
    assert_eq!(config.backends[0].kind, BackendKind::OpenaiCompatible);
    assert_eq!(config.backends[1].kind, BackendKind::AnthropicCompatible);
    assert_eq!(config.health.failure_threshold, 2);
    assert_eq!(config.rate_limit.window, Duration::from_secs(30));
    assert_eq!(config.logging.level, "debug");

    let dispatcher = Dispatcher::new(config).unwrap();
    assert_eq!(dispatcher.default_deadline(), Duration::from_secs(20));

    let statuses = dispatcher.get_backend_status();
    let names: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["primary", "claude", "ollama"]);
    assert_eq!(statuses[0].weight, 3);
    assert!(!statuses[2].enabled);
    assert!(statuses.iter().all(|s| s.health == HealthStatus::Healthy));
    assert!(statuses.iter().all(|s| s.total_attempts == 0));
}

#[tokio::test]
async fn test_json_file_matches_yaml() {
    let yaml = write_config(CONFIG_YAML, ".yml");
    let from_yaml = DispatcherConfig::from_file(yaml.path()).await.unwrap();

    let json = write_config(&serde_json::to_string_pretty(&from_yaml).unwrap(), ".json");
    let from_json = DispatcherConfig::from_file(json.path()).await.unwrap();

    assert_eq!(from_json, from_yaml);
}

#[tokio::test]
async fn test_missing_api_key_rejected() {
    let yaml = r#"
backends:
  - name: primary
    kind: openai_compatible
    base_url: https://api.example.com/v1
    api_key_env: LLM_DISPATCH_TEST_KEY_THAT_IS_NEVER_SET
    model: gpt-4o-mini
"#;
    let file = write_config(yaml, ".yaml");
    let err = DispatcherConfig::from_file(file.path()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Config(_)));
    assert!(err.to_string().contains("LLM_DISPATCH_TEST_KEY_THAT_IS_NEVER_SET"));
}

#[tokio::test]
async fn test_all_backends_disabled_rejected() {
    let yaml = r#"
backends:
  - name: ollama
    kind: local
    base_url: http://localhost:11434
    model: llama3
    enabled: false
"#;
    let file = write_config(yaml, ".yaml");
    let err = DispatcherConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("must be enabled"));
}

#[tokio::test]
async fn test_inverted_retry_delays_rejected() {
    let yaml = r#"
backends:
  - name: ollama
    kind: local
    base_url: http://localhost:11434
    model: llama3
retry:
  base_delay: 5
  max_delay: 1
"#;
    let file = write_config(yaml, ".yaml");
    let err = DispatcherConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("base_delay"));
}

#[tokio::test]
async fn test_unknown_kind_rejected() {
    let yaml = r#"
backends:
  - name: mystery
    kind: carrier_pigeon
    base_url: http://localhost:1
    model: m
"#;
    let file = write_config(yaml, ".yaml");
    let err = DispatcherConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[tokio::test]
async fn test_reload_from_new_file() {
    let file = write_config(CONFIG_YAML, ".yaml");
    let config = DispatcherConfig::from_file(file.path()).await.unwrap();
    let dispatcher = Dispatcher::new(config).unwrap();

    let replacement = r#"
backends:
  - name: ollama
    kind: local
    base_url: http://localhost:11434
    model: llama3
  - name: ollama-large
    kind: local
    base_url: http://localhost:11435
    model: llama3:70b
"#;
    let file = write_config(replacement, ".yaml");
    let new_config = DispatcherConfig::from_file(file.path()).await.unwrap();
    dispatcher.reload(new_config.backends).unwrap();

    let names: Vec<_> = dispatcher
        .get_backend_status()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["ollama", "ollama-large"]);
    assert_eq!(dispatcher.registry().selectable().len(), 2);
}
