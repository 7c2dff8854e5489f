//! llm-dispatch command line
//!
//! Sends completions through the dispatcher and inspects backend state.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_dispatch::config::CONFIG_ENV_VAR;
use llm_dispatch::{CompletionRequest, Dispatcher, DispatcherConfig, init_logging};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Debug, Parser)]
#[command(
    name = "llm-dispatch",
    version,
    long_version = LONG_VERSION,
    about = "Resilient dispatch across LLM backends"
)]
struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, env = CONFIG_ENV_VAR, default_value = "config/dispatch.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a completion
    Complete {
        prompt: String,
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Override the model of whichever backend serves the request
        #[arg(long)]
        model: Option<String>,
        /// Neither read nor write the response cache
        #[arg(long)]
        no_cache: bool,
        #[arg(long)]
        deadline_secs: Option<f64>,
    },
    /// Show health and performance of every backend
    Status,
    /// Send a tiny request to every enabled backend
    Probe,
    /// Show response cache statistics
    CacheStats,
    /// Empty the response cache, including its persisted copy
    ClearCache,
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = DispatcherConfig::from_file(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_logging(&config.logging);

    let dispatcher = Dispatcher::new(config)?;

    let ok = match cli.command {
        Command::Complete {
            prompt,
            system,
            temperature,
            max_tokens,
            model,
            no_cache,
            deadline_secs,
        } => {
            let mut request = CompletionRequest::new(prompt).with_cache(!no_cache);
            if let Some(system) = system {
                request = request.with_system(system);
            }
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }
            if let Some(max_tokens) = max_tokens {
                request = request.with_max_tokens(max_tokens);
            }
            if let Some(model) = model {
                request = request.with_model(model);
            }
            if let Some(secs) = deadline_secs {
                let deadline = Duration::try_from_secs_f64(secs)
                    .context("--deadline-secs must be a non-negative number")?;
                request = request.with_deadline(deadline);
            }

            match dispatcher.complete(request).await {
                Ok(response) => {
                    print_json(&response)?;
                    true
                }
                Err(error) => {
                    print_json(&json!({
                        "error": error.to_string(),
                        "attempts": error.attempts(),
                    }))?;
                    false
                }
            }
        }
        Command::Status => {
            print_json(&dispatcher.get_backend_status())?;
            true
        }
        Command::Probe => {
            let results = dispatcher.probe_backends().await;
            let ok = results.iter().all(|r| r.is_ok());
            let report: Vec<_> = results
                .iter()
                .map(|r| {
                    json!({
                        "backend": r.backend,
                        "ok": r.is_ok(),
                        "latency_ms": r.latency.as_millis() as u64,
                        "error": r.result.as_ref().err().map(ToString::to_string),
                    })
                })
                .collect();
            print_json(&report)?;
            ok
        }
        Command::CacheStats => {
            print_json(&dispatcher.get_cache_stats())?;
            true
        }
        Command::ClearCache => {
            dispatcher.clear_cache();
            true
        }
    };

    dispatcher.flush().await;
    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
