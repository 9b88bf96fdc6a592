//! End-to-end evaluation of reads.
//!
//! For one record the steps are strictly ordered:
//!
//! ```text
//! contradictions → re-path protocol → precedents → validation loop → persist
//! ```
//!
//! Records are independent of each other, so a batch runs one task per
//! record. Collaborator and storage failures become warnings on the
//! [`Evaluation`]; nothing here aborts a record.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analysis::{
    AnalysisRecord, ContradictionFlag, EvidenceSources, PrecedentData, RepathOutcome,
    RepathProtocol, ValidationInput, ValidationLoop, ValidationReport,
};
use crate::config::RequestConfig;
use crate::error::{AppError, AppResult};
use crate::services::{
    detect_contradictions_or_empty, lookup_precedents_or_empty, ContradictionDetector,
    PrecedentSource,
};
use crate::storage::Storage;

/// Default bound on one collaborator call: the worst case of the default
/// request config, so every retry gets its turn before the call degrades.
pub fn default_collaborator_timeout() -> Duration {
    Duration::from_millis(RequestConfig::default().call_budget_ms())
}

/// One read to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// The read and its analysis data, nested or flat shape.
    #[serde(default)]
    pub record: AnalysisRecord,
    /// Pre-computed flags; when set, the contradiction detector is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contradictions: Option<Vec<ContradictionFlag>>,
    /// External evidence for the reality check.
    #[serde(default)]
    pub evidence: EvidenceSources,
    /// Pre-fetched precedents; when set, the precedent source is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedents: Option<PrecedentData>,
}

impl EvaluationRequest {
    /// Request for a record with nothing pre-computed.
    pub fn new(record: AnalysisRecord) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    /// Supply contradiction flags.
    pub fn with_contradictions(mut self, flags: Vec<ContradictionFlag>) -> Self {
        self.contradictions = Some(flags);
        self
    }

    /// Supply evidence sources.
    pub fn with_evidence(mut self, evidence: EvidenceSources) -> Self {
        self.evidence = evidence;
        self
    }

    /// Supply precedent data.
    pub fn with_precedents(mut self, precedents: PrecedentData) -> Self {
        self.precedents = Some(precedents);
        self
    }
}

/// Everything produced for one read.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Re-path protocol outcome.
    pub repath: RepathOutcome,
    /// Validation report.
    pub report: ValidationReport,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<String>,
}

/// Wires the collaborators, the analysis core and the report sink together.
#[derive(Clone)]
pub struct ReadPipeline {
    detector: Arc<dyn ContradictionDetector>,
    precedent_source: Arc<dyn PrecedentSource>,
    storage: Option<Arc<dyn Storage>>,
    validation: ValidationLoop,
    collaborator_timeout: Duration,
}

impl ReadPipeline {
    /// Create a pipeline without persistence.
    pub fn new(
        detector: Arc<dyn ContradictionDetector>,
        precedent_source: Arc<dyn PrecedentSource>,
    ) -> Self {
        Self {
            detector,
            precedent_source,
            storage: None,
            validation: ValidationLoop::new(),
            collaborator_timeout: default_collaborator_timeout(),
        }
    }

    /// Persist every report to the given storage.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the validation loop.
    pub fn with_validation_loop(mut self, validation: ValidationLoop) -> Self {
        self.validation = validation;
        self
    }

    /// Bound each collaborator call, retries included.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// Evaluate one read.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Evaluation {
        let EvaluationRequest {
            record,
            contradictions,
            evidence,
            precedents,
        } = request;
        let mut warnings = Vec::new();

        let flags = match contradictions {
            Some(flags) => flags,
            None => {
                let outcome = detect_contradictions_or_empty(
                    self.detector.as_ref(),
                    &record.narrative_text,
                    self.collaborator_timeout,
                )
                .await;
                warnings.extend(outcome.warning);
                outcome.value
            }
        };

        let repath = RepathProtocol::execute(&record, &flags);

        let precedents = match precedents {
            Some(data) => Some(data),
            None => {
                let outcome = lookup_precedents_or_empty(
                    self.precedent_source.as_ref(),
                    &record,
                    self.collaborator_timeout,
                )
                .await;
                warnings.extend(outcome.warning);
                outcome.value
            }
        };

        let input = ValidationInput::new(&record)
            .with_contradictions(&flags)
            .with_evidence(&evidence)
            .with_precedents(precedents.as_ref());
        let report = self.validation.run(&input);

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_report(&report).await {
                warn!(report_id = %report.id, error = %e, "Failed to persist report");
                warnings.push(format!("Report not persisted: {}", e));
            }
        }

        info!(
            report_id = %report.id,
            bsi = %repath.bsi_score,
            repath_required = repath.repath_required,
            overall = report.overall_validation_score,
            status = %report.validation_status,
            warnings = warnings.len(),
            "Read evaluated"
        );

        Evaluation {
            repath,
            report,
            warnings,
        }
    }

    /// Evaluate many reads concurrently, one task each.
    ///
    /// Results come back in input order.
    pub async fn evaluate_batch(&self, requests: Vec<EvaluationRequest>) -> AppResult<Vec<Evaluation>> {
        let total = requests.len();
        let mut tasks = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let pipeline = self.clone();
            tasks.spawn(async move { (index, pipeline.evaluate(request).await) });
        }

        let mut slots: Vec<Option<Evaluation>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, evaluation) = joined.map_err(|e| AppError::Internal {
                message: format!("Evaluation task failed: {}", e),
            })?;
            slots[index] = Some(evaluation);
        }

        info!(records = total, "Batch evaluated");
        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| AppError::Internal {
                    message: "Evaluation task produced no result".to_string(),
                })
            })
            .collect()
    }
}
