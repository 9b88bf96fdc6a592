use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{ReportSummary, Storage};
use crate::analysis::{ValidationReport, ValidationStatus};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory instance, mainly for tests.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// capped at one connection.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_report(&self, report: &ValidationReport) -> StorageResult<()> {
        let report_json = serde_json::to_string(report).map_err(|e| StorageError::Query {
            message: format!("Failed to serialize report: {}", e),
        })?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO validation_reports
                (id, created_at, status, overall_score, bsi_score, repath_required, report_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.validation_timestamp.to_rfc3339())
        .bind(report.validation_status.as_str())
        .bind(report.overall_validation_score)
        .bind(report.bsi_score.value())
        .bind(!report.repath_prompts.is_empty())
        .bind(&report_json)
        .execute(&self.pool)
        .await?;

        debug!(report_id = %report.id, status = %report.validation_status, "Report saved");
        Ok(())
    }

    async fn get_report(&self, id: &str) -> StorageResult<Option<ValidationReport>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT report_json FROM validation_reports WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(json,)| {
            serde_json::from_str(&json).map_err(|e| StorageError::Query {
                message: format!("Stored report {} is not valid: {}", id, e),
            })
        })
        .transpose()
    }

    async fn list_reports(&self, limit: u32) -> StorageResult<Vec<ReportSummary>> {
        let rows: Vec<ReportRow> = sqlx::query_as(
            r#"
            SELECT id, created_at, status, overall_score, bsi_score, repath_required
            FROM validation_reports
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReportSummary::try_from).collect()
    }

    async fn delete_report(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM validation_reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ReportNotFound {
                report_id: id.to_string(),
            });
        }

        Ok(())
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    created_at: String,
    status: String,
    overall_score: f64,
    bsi_score: f64,
    repath_required: bool,
}

impl TryFrom<ReportRow> for ReportSummary {
    type Error = StorageError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let status = row
            .status
            .parse::<ValidationStatus>()
            .map_err(|message| StorageError::Query { message })?;

        Ok(Self {
            id: row.id,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            status,
            overall_score: row.overall_score,
            bsi_score: row.bsi_score,
            repath_required: row.repath_required,
        })
    }
}
