//! Checklist stage: five weighted sub-checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{CheckResult, Severity, ValidationInput};
use crate::analysis::patterns::{MAX_CONTRADICTIONS, MIN_BREATHABILITY};
use crate::analysis::record::Factor;

/// Score lost per contradiction flag.
const CONTRADICTION_PENALTY: f64 = 2.5;

/// Cascade stages below this completion are reported.
const WEAK_STAGE_COMPLETION: f64 = 50.0;

/// Belief may exceed its supporting factors by this much before it counts
/// as overconfident.
const CALIBRATION_TOLERANCE: f64 = 2.0;

/// A pluggable scoring function for one checklist item.
pub trait CheckPolicy: Send + Sync {
    /// Score the input and list what is wrong with it.
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult;
}

impl<F> CheckPolicy for F
where
    F: Fn(&ValidationInput<'_>) -> CheckResult + Send + Sync,
{
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        self(input)
    }
}

/// The five checklist items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    /// Statements do not contradict each other.
    LogicalConsistency,
    /// The narrative has all necessary elements.
    NarrativeCompleteness,
    /// Claims rest on observable evidence.
    EvidenceGrounding,
    /// Predictions are specific enough to be validated.
    PredictionSpecificity,
    /// Confidence matches the strength of the support.
    ConfidenceCalibration,
}

impl ChecklistItem {
    /// All items in execution order.
    pub const ALL: [ChecklistItem; 5] = [
        ChecklistItem::LogicalConsistency,
        ChecklistItem::NarrativeCompleteness,
        ChecklistItem::EvidenceGrounding,
        ChecklistItem::PredictionSpecificity,
        ChecklistItem::ConfidenceCalibration,
    ];

    /// Get the item name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistItem::LogicalConsistency => "logical_consistency",
            ChecklistItem::NarrativeCompleteness => "narrative_completeness",
            ChecklistItem::EvidenceGrounding => "evidence_grounding",
            ChecklistItem::PredictionSpecificity => "prediction_specificity",
            ChecklistItem::ConfidenceCalibration => "confidence_calibration",
        }
    }

    /// Weight of the item in the checklist score.
    pub fn weight(&self) -> f64 {
        match self {
            ChecklistItem::LogicalConsistency => 0.25,
            ChecklistItem::NarrativeCompleteness => 0.25,
            ChecklistItem::EvidenceGrounding => 0.2,
            ChecklistItem::PredictionSpecificity => 0.15,
            ChecklistItem::ConfidenceCalibration => 0.15,
        }
    }

    fn default_policy(&self) -> Arc<dyn CheckPolicy> {
        match self {
            ChecklistItem::LogicalConsistency => Arc::new(LogicalConsistencyCheck),
            ChecklistItem::NarrativeCompleteness => Arc::new(NarrativeCompletenessCheck),
            ChecklistItem::EvidenceGrounding => Arc::new(EvidenceGroundingCheck),
            ChecklistItem::PredictionSpecificity => Arc::new(PredictionSpecificityCheck),
            ChecklistItem::ConfidenceCalibration => Arc::new(ConfidenceCalibrationCheck),
        }
    }
}

impl std::fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the checklist stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistResult {
    /// Weighted mean of the item scores.
    pub score: f64,
    /// Per-item results.
    pub checks: BTreeMap<ChecklistItem, CheckResult>,
}

/// The checklist stage with one policy per item.
#[derive(Clone)]
pub struct Checklist {
    policies: BTreeMap<ChecklistItem, Arc<dyn CheckPolicy>>,
}

impl Default for Checklist {
    fn default() -> Self {
        Self {
            policies: ChecklistItem::ALL
                .iter()
                .map(|item| (*item, item.default_policy()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Checklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.policies.keys()).finish()
    }
}

impl Checklist {
    /// Replace the policy for one item.
    pub fn with_policy(mut self, item: ChecklistItem, policy: Arc<dyn CheckPolicy>) -> Self {
        self.policies.insert(item, policy);
        self
    }

    /// Run every item and combine the scores.
    pub fn run(&self, input: &ValidationInput<'_>) -> ChecklistResult {
        let checks: BTreeMap<ChecklistItem, CheckResult> = self
            .policies
            .iter()
            .map(|(item, policy)| {
                // Re-clamp: custom policies may build results by hand.
                let mut result = policy.evaluate(input);
                result.score = super::clamp_score(result.score);
                (*item, result)
            })
            .collect();

        let (weighted, total_weight) = checks
            .iter()
            .fold((0.0, 0.0), |(sum, weights), (item, result)| {
                (sum + item.weight() * result.score, weights + item.weight())
            });
        let score = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };

        ChecklistResult { score, checks }
    }
}

// ============================================================================
// Default policies
// ============================================================================

/// Penalizes each contradiction flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalConsistencyCheck;

impl CheckPolicy for LogicalConsistencyCheck {
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        let flags = input.contradictions;
        let severity = if flags.len() > MAX_CONTRADICTIONS {
            Severity::Critical
        } else {
            Severity::Major
        };
        flags.iter().fold(
            CheckResult::new(10.0 - CONTRADICTION_PENALTY * flags.len() as f64),
            |result, flag| {
                result.with_issue(format!("{}: {}", flag.pattern, flag.statement), severity)
            },
        )
    }
}

/// Re-uses the narrative breathability factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeCompletenessCheck;

impl CheckPolicy for NarrativeCompletenessCheck {
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        match input.record.factor_if_present(Factor::NarrativeBreathability) {
            None => CheckResult::new(0.0)
                .with_issue("Narrative breathability was not scored", Severity::Critical),
            Some(score) if score < MIN_BREATHABILITY => CheckResult::new(score).with_issue(
                format!(
                    "Narrative underdeveloped ({:.1} below {:.1}): stakes and historical context missing",
                    score, MIN_BREATHABILITY
                ),
                Severity::Major,
            ),
            Some(score) => CheckResult::new(score),
        }
    }
}

/// Scores by how many evidence sources were supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceGroundingCheck;

impl CheckPolicy for EvidenceGroundingCheck {
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        let missing = input.evidence.missing_sources();
        let present = super::EvidenceSource::ALL.len() - missing.len();
        let result = CheckResult::new(4.0 + 2.0 * present as f64);

        if present == 0 {
            return result.with_issue(
                "No external evidence supports the read",
                Severity::Critical,
            );
        }
        missing.iter().fold(result, |result, source| {
            result.with_issue(format!("No {} evidence supplied", source.label()), Severity::Minor)
        })
    }
}

/// Scores the mean cascade completion and reports weak stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionSpecificityCheck;

impl CheckPolicy for PredictionSpecificityCheck {
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        let completions = input.record.completions();
        if completions.is_empty() {
            return CheckResult::new(0.0).with_issue(
                "No reasoning chain recorded; the prediction cannot be validated",
                Severity::Critical,
            );
        }

        let mean = completions.iter().sum::<f64>() / completions.len() as f64;
        completions
            .iter()
            .enumerate()
            .filter(|(_, c)| **c < WEAK_STAGE_COMPLETION)
            .fold(CheckResult::new(mean / 10.0), |result, (i, c)| {
                result.with_issue(
                    format!("Reasoning stage {} only {:.0}% complete", i + 1, c),
                    Severity::Major,
                )
            })
    }
}

/// Compares belief intensity against the factors that should support it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceCalibrationCheck;

impl CheckPolicy for ConfidenceCalibrationCheck {
    fn evaluate(&self, input: &ValidationInput<'_>) -> CheckResult {
        let record = input.record;
        let Some(belief) = record.factor_if_present(Factor::BeliefIntensity) else {
            return CheckResult::new(super::NEUTRAL_SOURCE_SCORE)
                .with_issue("Belief intensity was not scored", Severity::Minor);
        };

        let support: Vec<f64> = [Factor::SymbolicAlignment, Factor::NarrativeBreathability]
            .iter()
            .filter_map(|&f| record.factor_if_present(f))
            .collect();
        let support = if support.is_empty() {
            0.0
        } else {
            support.iter().sum::<f64>() / support.len() as f64
        };

        let gap = (belief - support).max(0.0);
        let result = CheckResult::new(10.0 - 2.0 * gap);
        if gap <= CALIBRATION_TOLERANCE {
            return result;
        }

        let severity = if gap > 2.0 * CALIBRATION_TOLERANCE {
            Severity::Critical
        } else {
            Severity::Major
        };
        result.with_issue(
            format!(
                "Confidence ({:.1}) outruns the supporting factors ({:.1})",
                belief, support
            ),
            severity,
        )
    }
}
