//! Storage layer for validation reports.
//!
//! The full report is stored as JSON next to a handful of indexed columns
//! used for listing.

mod sqlite;


pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{ValidationReport, ValidationStatus};
use crate::error::StorageResult;

/// Listing row for a stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Report identifier.
    pub id: String,
    /// When the report was generated.
    pub created_at: DateTime<Utc>,
    /// Pass/fail gate.
    pub status: ValidationStatus,
    /// Aggregate validation score.
    pub overall_score: f64,
    /// BSI score of the read.
    pub bsi_score: f64,
    /// Whether re-path prompts were issued.
    pub repath_required: bool,
}

impl From<&ValidationReport> for ReportSummary {
    fn from(report: &ValidationReport) -> Self {
        Self {
            id: report.id.to_string(),
            created_at: report.validation_timestamp,
            status: report.validation_status,
            overall_score: report.overall_validation_score,
            bsi_score: report.bsi_score.value(),
            repath_required: !report.repath_prompts.is_empty(),
        }
    }
}

/// Report sink.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a report. Saving the same id twice replaces the earlier copy.
    async fn save_report(&self, report: &ValidationReport) -> StorageResult<()>;
    /// Get a report by ID.
    async fn get_report(&self, id: &str) -> StorageResult<Option<ValidationReport>>;
    /// Most recent reports first.
    async fn list_reports(&self, limit: u32) -> StorageResult<Vec<ReportSummary>>;
    /// Delete a report; fails with `ReportNotFound` for unknown ids.
    async fn delete_report(&self, id: &str) -> StorageResult<()>;
}
