use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ServiceOutcome;
use crate::analysis::{ContradictionFlag, ContradictionPattern};
use crate::error::LangbaseResult;
use crate::langbase::{
    ContradictionDetectionResponse, DetectedContradiction, LangbaseClient, Message, PipeRequest,
};
use crate::prompts::CONTRADICTION_DETECTION_PROMPT;

/// Finds internal contradictions in a narrative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContradictionDetector: Send + Sync {
    /// Flag the contradictions in a read's narrative text.
    async fn detect(&self, narrative: &str) -> LangbaseResult<Vec<ContradictionFlag>>;
}

/// Contradiction detector backed by a Langbase pipe.
#[derive(Clone)]
pub struct LangbaseContradictionDetector {
    client: LangbaseClient,
    pipe_name: String,
}

impl LangbaseContradictionDetector {
    /// Create a detector that calls the given pipe.
    pub fn new(client: LangbaseClient, pipe_name: impl Into<String>) -> Self {
        Self {
            client,
            pipe_name: pipe_name.into(),
        }
    }

    /// Name of the pipe this detector calls.
    pub fn pipe_name(&self) -> &str {
        &self.pipe_name
    }
}

#[async_trait]
impl ContradictionDetector for LangbaseContradictionDetector {
    async fn detect(&self, narrative: &str) -> LangbaseResult<Vec<ContradictionFlag>> {
        if narrative.trim().is_empty() {
            debug!("Empty narrative, skipping contradiction detection");
            return Ok(Vec::new());
        }

        let messages = vec![
            Message::system(CONTRADICTION_DETECTION_PROMPT),
            Message::user(format!(
                "Analyze the following read for internal contradictions:\n\n{}",
                narrative
            )),
        ];
        let request = PipeRequest::new(&self.pipe_name, messages);
        let response = self.client.call_pipe(request).await?;

        let parsed = ContradictionDetectionResponse::parse_completion(&response.completion)?;
        let flags: Vec<ContradictionFlag> = parsed
            .contradictions
            .into_iter()
            .filter_map(into_flag)
            .collect();

        info!(pipe = %self.pipe_name, flags = flags.len(), "Contradiction detection complete");
        Ok(flags)
    }
}

fn into_flag(detected: DetectedContradiction) -> Option<ContradictionFlag> {
    match detected.pattern.parse::<ContradictionPattern>() {
        Ok(pattern) => Some(ContradictionFlag::new(
            detected.statement,
            pattern,
            detected.flag,
        )),
        Err(e) => {
            warn!(
                error = %e,
                statement = %detected.statement,
                "Dropping contradiction with unknown pattern"
            );
            None
        }
    }
}

/// Run the detector with a bounded timeout, degrading to no flags on failure.
pub async fn detect_contradictions_or_empty(
    detector: &dyn ContradictionDetector,
    narrative: &str,
    timeout: Duration,
) -> ServiceOutcome<Vec<ContradictionFlag>> {
    match tokio::time::timeout(timeout, detector.detect(narrative)).await {
        Ok(Ok(flags)) => ServiceOutcome::ok(flags),
        Ok(Err(e)) => {
            warn!(error = %e, "Contradiction detector failed, continuing without flags");
            ServiceOutcome::degraded(Vec::new(), format!("Contradiction detection failed: {}", e))
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis();
            warn!(timeout_ms, "Contradiction detector timed out, continuing without flags");
            ServiceOutcome::degraded(
                Vec::new(),
                format!("Contradiction detection timed out after {}ms", timeout_ms),
            )
        }
    }
}
