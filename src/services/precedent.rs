use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::ServiceOutcome;
use crate::analysis::{AnalysisRecord, PrecedentData};
use crate::error::LangbaseResult;
use crate::langbase::{LangbaseClient, Message, PipeRequest, PrecedentLookupResponse};
use crate::prompts::PRECEDENT_LOOKUP_PROMPT;

/// Looks up historical precedents for a read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrecedentSource: Send + Sync {
    /// Find comparable historical situations for the record.
    async fn lookup(&self, record: &AnalysisRecord) -> LangbaseResult<PrecedentData>;
}

/// Precedent source backed by a Langbase pipe.
#[derive(Clone)]
pub struct LangbasePrecedentSource {
    client: LangbaseClient,
    pipe_name: String,
}

impl LangbasePrecedentSource {
    /// Create a source that calls the given pipe.
    pub fn new(client: LangbaseClient, pipe_name: impl Into<String>) -> Self {
        Self {
            client,
            pipe_name: pipe_name.into(),
        }
    }
}

#[async_trait]
impl PrecedentSource for LangbasePrecedentSource {
    async fn lookup(&self, record: &AnalysisRecord) -> LangbaseResult<PrecedentData> {
        let factors = serde_json::to_string(&record.factor_scores).unwrap_or_default();
        let messages = vec![
            Message::system(PRECEDENT_LOOKUP_PROMPT),
            Message::user(format!(
                "Factor scores: {}\n\nRead:\n{}",
                factors, record.narrative_text
            )),
        ];
        let request = PipeRequest::new(&self.pipe_name, messages);
        let response = self.client.call_pipe(request).await?;

        let data: PrecedentData =
            PrecedentLookupResponse::parse_completion(&response.completion)?.into();
        info!(
            pipe = %self.pipe_name,
            precedents = data.historical_precedents.len(),
            accuracy = ?data.precedent_accuracy,
            "Precedent lookup complete"
        );
        Ok(data)
    }
}

/// Run the lookup with a bounded timeout, degrading to no data on failure.
pub async fn lookup_precedents_or_empty(
    source: &dyn PrecedentSource,
    record: &AnalysisRecord,
    timeout: Duration,
) -> ServiceOutcome<Option<PrecedentData>> {
    match tokio::time::timeout(timeout, source.lookup(record)).await {
        Ok(Ok(data)) if data.is_empty() => ServiceOutcome::ok(None),
        Ok(Ok(data)) => ServiceOutcome::ok(Some(data)),
        Ok(Err(e)) => {
            warn!(error = %e, "Precedent lookup failed, continuing without precedents");
            ServiceOutcome::degraded(None, format!("Precedent lookup failed: {}", e))
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis();
            warn!(timeout_ms, "Precedent lookup timed out, continuing without precedents");
            ServiceOutcome::degraded(
                None,
                format!("Precedent lookup timed out after {}ms", timeout_ms),
            )
        }
    }
}
