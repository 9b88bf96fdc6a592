use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bsi_read_analysis::{
    config::{Config, LogFormat},
    langbase::LangbaseClient,
    prompts::{CONTRADICTION_DETECTION_PROMPT, PRECEDENT_LOOKUP_PROMPT},
    services::{LangbaseContradictionDetector, LangbasePrecedentSource},
    storage::SqliteStorage,
    EvaluationRequest, ReadPipeline,
};

/// Evaluate analytical reads and print the re-path outcome and validation report.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON file with one request or an array of requests (stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Skip writing reports to the database
    #[arg(long)]
    no_persist: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Batch(Vec<EvaluationRequest>),
    Single(Box<EvaluationRequest>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "BSI read analysis starting..."
    );

    // Initialize Langbase client
    let langbase = match LangbaseClient::new(&config.langbase, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Langbase client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Langbase client");
            return Err(e.into());
        }
    };

    // Missing pipes degrade to empty collaborator results, so this is not fatal
    let pipes = [
        (
            config.pipes.contradiction.as_str(),
            "Flags internal contradictions in a read",
            CONTRADICTION_DETECTION_PROMPT,
        ),
        (
            config.pipes.precedent.as_str(),
            "Finds historical precedents for a read",
            PRECEDENT_LOOKUP_PROMPT,
        ),
    ];
    for (name, description, prompt) in pipes {
        if let Err(e) = langbase.ensure_pipe(name, description, prompt).await {
            warn!(pipe = %name, error = %e, "Failed to ensure pipe exists");
        }
    }

    let mut pipeline = ReadPipeline::new(
        Arc::new(LangbaseContradictionDetector::new(
            langbase.clone(),
            config.pipes.contradiction.clone(),
        )),
        Arc::new(LangbasePrecedentSource::new(
            langbase,
            config.pipes.precedent.clone(),
        )),
    )
    .with_collaborator_timeout(Duration::from_millis(config.pipes.detector_timeout_ms));

    // Initialize storage
    if !args.no_persist {
        match SqliteStorage::new(&config.database).await {
            Ok(s) => {
                info!(path = %config.database.path.display(), "Database initialized");
                pipeline = pipeline.with_storage(Arc::new(s));
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize database");
                return Err(e.into());
            }
        }
    }

    let raw = read_input(args.input.as_ref())?;
    let input: Input = serde_json::from_str(&raw).context("Input is not a valid request")?;

    let output = match input {
        Input::Single(request) => serde_json::to_string_pretty(&pipeline.evaluate(*request).await)?,
        Input::Batch(requests) => {
            info!(records = requests.len(), "Evaluating batch");
            serde_json::to_string_pretty(&pipeline.evaluate_batch(requests).await?)?
        }
    };
    println!("{}", output);

    info!("Evaluation complete");
    Ok(())
}

/// Read the whole request from a file, or stdin when no file is given.
fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
