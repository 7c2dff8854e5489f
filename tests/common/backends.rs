//! Scripted in-process backends
//!
//! A [`ScriptedBackend`] plays back a list of [`Step`]s, one per call, and
//! then repeats its fallback step forever.

use async_trait::async_trait;
use llm_dispatch::{
    Backend, BackendConfig, BackendKind, CompletionRequest, ProviderError, RawCompletion,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// What a scripted backend does on one call
#[derive(Debug, Clone)]
pub enum Step {
    /// Reply `"<backend>: <prompt>"`
    Echo,
    Reply(String),
    Fail(ProviderError),
    /// Wait, then perform the inner step
    Delay(Duration, Box<Step>),
}

impl Step {
    pub fn delayed(delay: Duration, step: Step) -> Self {
        Self::Delay(delay, Box::new(step))
    }
}

#[derive(Debug)]
pub struct ScriptedBackend {
    config: BackendConfig,
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Step>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Local backend with no rate limit, 3 retries and a 60 s timeout
    pub fn config(name: &str) -> BackendConfig {
        BackendConfig::new(name, BackendKind::Local, "http://localhost:11434", "test-model")
            .with_rate_limit(0)
    }

    pub fn with_config(config: BackendConfig, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            config,
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Always succeeds
    pub fn echo(name: &str) -> Arc<Self> {
        Self::with_config(Self::config(name), Step::Echo)
    }

    /// Always fails with `error`
    pub fn failing(name: &str, error: ProviderError) -> Arc<Self> {
        Self::with_config(Self::config(name), Step::Fail(error))
    }

    /// Always fails with a retryable 503
    pub fn unavailable(name: &str) -> Arc<Self> {
        Self::failing(
            name,
            ProviderError::provider_unavailable(name, "503 service unavailable"),
        )
    }

    /// Queue steps to run before the fallback step
    pub fn push_steps(&self, steps: impl IntoIterator<Item = Step>) {
        self.script.lock().extend(steps);
    }

    /// Replace the step used once the script is empty
    pub fn set_fallback(&self, step: Step) {
        *self.fallback.lock() = step;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn as_backend(self: &Arc<Self>) -> Arc<dyn Backend> {
        self.clone()
    }

    fn next_step(&self) -> Step {
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().clone())
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());

        let mut step = self.next_step();
        loop {
            match step {
                Step::Echo => {
                    return Ok(RawCompletion::new(format!(
                        "{}: {}",
                        self.config.name, request.prompt
                    )));
                }
                Step::Reply(text) => return Ok(RawCompletion::new(text)),
                Step::Fail(error) => return Err(error),
                Step::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    step = *inner;
                }
            }
        }
    }
}
