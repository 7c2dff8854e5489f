//! Live completions through the dispatcher
//!
//! Run with: cargo test -- --ignored

#[cfg(test)]
mod tests {
    use crate::skip_without_env;
    use llm_dispatch::{
        BackendConfig, BackendKind, CompletionRequest, Dispatcher, DispatcherConfig,
    };
    use std::time::Duration;

    fn openai() -> BackendConfig {
        let mut backend = BackendConfig::new(
            "openai",
            BackendKind::OpenaiCompatible,
            "https://api.openai.com/v1",
            "gpt-4o-mini",
        );
        backend.api_key_env = Some("OPENAI_API_KEY".to_string());
        backend
    }

    fn anthropic() -> BackendConfig {
        let mut backend = BackendConfig::new(
            "anthropic",
            BackendKind::AnthropicCompatible,
            "https://api.anthropic.com/v1",
            "claude-3-5-haiku-latest",
        );
        backend.api_key_env = Some("ANTHROPIC_API_KEY".to_string());
        backend
    }

    fn ollama() -> Option<BackendConfig> {
        let base_url = std::env::var("OLLAMA_BASE_URL").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string());
        Some(BackendConfig::new("ollama", BackendKind::Local, base_url, model))
    }

    fn dispatcher(backends: Vec<BackendConfig>) -> Dispatcher {
        let mut config = DispatcherConfig::new(backends);
        config.default_deadline = Some(Duration::from_secs(60));
        Dispatcher::new(config).expect("Failed to build dispatcher")
    }

    fn short_request(prompt: &str) -> CompletionRequest {
        CompletionRequest::new(prompt)
            .with_max_tokens(20)
            .with_temperature(0.0)
    }

    #[tokio::test]
    #[ignore]
    async fn test_openai_completion() {
        skip_without_env!("OPENAI_API_KEY");

        let dispatcher = dispatcher(vec![openai()]);
        let response = dispatcher
            .complete(short_request("Say 'test passed' and nothing else"))
            .await;

        assert!(response.is_ok(), "Completion failed: {:?}", response.err());
        let response = response.unwrap();
        assert_eq!(response.backend_used.as_deref(), Some("openai"));
        assert!(!response.text.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_anthropic_completion_with_system() {
        skip_without_env!("ANTHROPIC_API_KEY");

        let dispatcher = dispatcher(vec![anthropic()]);
        let response = dispatcher
            .complete(short_request("What is 2+2?").with_system("Answer with a single digit."))
            .await
            .expect("Completion failed");

        assert!(response.text.contains('4'), "unexpected answer: {}", response.text);
    }

    #[tokio::test]
    #[ignore]
    async fn test_ollama_completion() {
        skip_without_env!("OLLAMA_BASE_URL");
        let Some(backend) = ollama() else { return };

        let dispatcher = dispatcher(vec![backend]);
        let response = dispatcher
            .complete(short_request("Reply with the word pong"))
            .await
            .expect("Completion failed");

        assert!(!response.text.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_second_identical_request_is_cached() {
        skip_without_env!("OPENAI_API_KEY");

        let dispatcher = dispatcher(vec![openai()]);
        let request = short_request("Name one primary color");
        let first = dispatcher.complete(request.clone()).await.expect("first");
        let second = dispatcher.complete(request).await.expect("second");

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    #[ignore]
    async fn test_bad_key_falls_back_to_ollama() {
        skip_without_env!("OLLAMA_BASE_URL");
        let Some(local) = ollama() else { return };

        let broken = BackendConfig::new(
            "openai-broken",
            BackendKind::OpenaiCompatible,
            "https://api.openai.com/v1",
            "gpt-4o-mini",
        )
        .with_api_key("sk-invalid")
        .with_max_retries(1);

        let dispatcher = dispatcher(vec![broken, local]);
        let response = dispatcher
            .complete(short_request("Reply with the word pong").with_cache(false))
            .await
            .expect("fallback failed");

        assert_eq!(response.backend_used.as_deref(), Some("ollama"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_probe_live_backends() {
        skip_without_env!("OPENAI_API_KEY");

        let mut backends = vec![openai()];
        backends.extend(ollama());
        let dispatcher = dispatcher(backends);

        let results = dispatcher.probe_backends().await;
        let openai = results.iter().find(|r| r.backend == "openai").unwrap();
        assert!(openai.is_ok(), "probe failed: {:?}", openai.result);
    }
}
