//! gner - query named-entity extraction over a dataset.
//!
//! Reads `<data-dir>/<dataset>/raw/*.json`, extracts the named entities of
//! every question with the chosen LLM, and writes
//! `<data-dir>/<dataset>/tmp/<dataset>_queries.named_entity_output.tsv`.
//! A run whose cache already matches the dataset does no LLM calls.
//!
//! # Configuration
//!
//! Settings are layered: built-in defaults, then `--config <file>`
//! (TOML, JSON or YAML), then environment variables, then flags.
//!
//! - `OPENAI_API_KEY` - required for `--llm openai`
//! - `TOGETHER_API_KEY` - required for `--llm together`
//! - `GNER_LLM`, `GNER_MODEL`, `GNER_DATA_DIR`, `GNER_NUM_WORKERS`
//! - `RUST_LOG` - log filter, `info` by default
//!
//! A `.env` file in the working directory is loaded first.
//!
//! # Usage
//!
//! ```text
//! gner --dataset hotpotqa --llm openai --model_name gpt-3.5-turbo-1106 --num_processes 4
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gner_core::{DriverOutcome, GnerConfig, LlmProvider, QueryNerDriver};
use gner_llm::LlmFactory;

/// Extract named entities from dataset questions with an LLM.
#[derive(Parser, Debug)]
#[command(name = "gner", version)]
#[command(about = "Extract named entities from dataset questions with an LLM")]
struct Args {
    /// Dataset name, e.g. "hotpotqa" or "musique"
    #[arg(long)]
    dataset: String,

    /// LLM backend: openai, together, ollama or llama.cpp [default: openai]
    #[arg(long)]
    llm: Option<LlmProvider>,

    /// Model name [default: gpt-3.5-turbo-1106]
    #[arg(long, alias = "model_name")]
    model_name: Option<String>,

    /// Number of parallel workers [default: 1]
    #[arg(long, alias = "num_processes")]
    num_processes: Option<usize>,

    /// Root directory holding the datasets [default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Layer the configuration file, environment and flags.
    fn into_config(self) -> Result<(GnerConfig, String)> {
        self.into_config_from(|name| std::env::var(name).ok())
    }

    /// Same as [`Args::into_config`], reading variables through `env`.
    fn into_config_from(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(GnerConfig, String)> {
        let mut config = match &self.config {
            Some(path) => GnerConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => GnerConfig::default(),
        };
        config.apply_env_from(&env);

        if let Some(llm) = self.llm {
            config.llm.provider = llm;
        }
        if let Some(model) = self.model_name {
            config.llm.config.model = model;
        }
        if let Some(n) = self.num_processes {
            config.num_workers = n;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }

        // Keys last: the provider may have come from any layer above.
        config.resolve_api_keys_from(&env);

        Ok((config, self.dataset))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (config, dataset) = Args::parse().into_config()?;

    tracing::info!(
        dataset = %dataset,
        llm = %config.llm.provider,
        model = %config.llm.config.model,
        workers = config.num_workers,
        "Starting query NER"
    );

    let connector = LlmFactory::connector(config.llm.clone());
    let driver = QueryNerDriver::new(&config, dataset, connector)?;

    match driver.run().await {
        DriverOutcome::Computed { rows, total_tokens } => {
            tracing::info!(rows, total_tokens, "Done");
            Ok(ExitCode::SUCCESS)
        }
        DriverOutcome::Cached { rows } => {
            tracing::info!(rows, "Nothing to do");
            Ok(ExitCode::SUCCESS)
        }
        DriverOutcome::Failed { .. } => Ok(ExitCode::FAILURE),
    }
}
