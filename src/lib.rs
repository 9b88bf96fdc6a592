//! # BSI Read Analysis
//!
//! Scores the quality of a sports-match analytical "read", detects weak
//! reasoning patterns, issues corrective re-path prompts and validates the
//! read against external evidence and historical precedent.
//!
//! ## Features
//!
//! - **BSI scoring**: weighted mean of four 0-10 factor scores
//! - **Pattern detection**: contradictions, uneven cascades, thin narratives, binary thinking
//! - **Re-path protocol**: prioritized corrective prompts for reads below threshold
//! - **Validation loop**: checklist, reality check, precedent and gap analysis into one report
//! - **Collaborators**: contradiction detection and precedent lookup over Langbase pipes
//!
//! ## Architecture
//!
//! ```text
//! Read (JSON) → ReadPipeline → Langbase Pipes (HTTP)
//!                    ↓
//!          analysis core (pure, sync)
//!                    ↓
//!              SQLite (reports)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bsi_read_analysis::{Config, EvaluationRequest, ReadPipeline};
//! use bsi_read_analysis::langbase::LangbaseClient;
//! use bsi_read_analysis::services::{LangbaseContradictionDetector, LangbasePrecedentSource};
//! use bsi_read_analysis::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = LangbaseClient::new(&config.langbase, config.request.clone())?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let pipeline = ReadPipeline::new(
//!         Arc::new(LangbaseContradictionDetector::new(client.clone(), &config.pipes.contradiction)),
//!         Arc::new(LangbasePrecedentSource::new(client, &config.pipes.precedent)),
//!     )
//!     .with_storage(Arc::new(storage));
//!     let evaluation = pipeline.evaluate(EvaluationRequest::default()).await;
//!     println!("{}", serde_json::to_string_pretty(&evaluation)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Pure analysis core: scoring, patterns, re-path prompts and validation.
pub mod analysis;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Langbase API client and types for pipe communication.
pub mod langbase;
/// Orchestration of one or many read evaluations.
pub mod pipeline;
/// System prompts and prompt texts.
pub mod prompts;
/// Remote collaborators with timeout and degradation handling.
pub mod services;
/// SQLite storage layer for validation reports.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use pipeline::{Evaluation, EvaluationRequest, ReadPipeline};
