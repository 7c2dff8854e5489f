//! End-to-end tests against real backends
//!
//! These tests make real API calls and require credentials or a running server.
//! Run with: cargo test -- --ignored
//!
//! Environment variables:
//! - OPENAI_API_KEY: For OpenAI tests
//! - ANTHROPIC_API_KEY: For Anthropic tests
//! - OLLAMA_BASE_URL: For local Ollama tests (e.g. `http://localhost:11434`)

pub mod live_backends;
