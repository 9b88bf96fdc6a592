//! Final report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChecklistItem, DetailedResults, Severity, REALITY_GAP_THRESHOLD};
use crate::analysis::patterns::PatternSet;
use crate::analysis::repath::RepathPrompt;
use crate::analysis::score::BsiScore;

/// A report must score strictly above this to pass.
pub const PASS_THRESHOLD: f64 = 7.0;

/// Checklist items below this score produce a learning point.
const WEAK_CHECK_SCORE: f64 = 6.0;

/// Outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Overall score above the pass threshold.
    Passed,
    /// Overall score at or below the pass threshold.
    RequiresRevision,
}

impl ValidationStatus {
    /// Status for an overall score.
    pub fn from_score(score: f64) -> Self {
        if score > PASS_THRESHOLD {
            ValidationStatus::Passed
        } else {
            ValidationStatus::RequiresRevision
        }
    }

    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Passed => "passed",
            ValidationStatus::RequiresRevision => "requires_revision",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(ValidationStatus::Passed),
            "requires_revision" => Ok(ValidationStatus::RequiresRevision),
            _ => Err(format!("Unknown validation status: {}", s)),
        }
    }
}

/// Pluggable overall-score policy.
pub trait AggregatePolicy: Send + Sync {
    /// Combine the stage results into one score in [0, 10].
    fn overall_score(&self, results: &DetailedResults) -> f64;
}

/// Weighted mean of the stage scores.
///
/// Stages without a score are dropped and the remaining weights renormalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedStageAggregate {
    /// Weight of the checklist score.
    pub checklist: f64,
    /// Weight of the combined reality score.
    pub reality_check: f64,
    /// Weight of the precedent score.
    pub precedent: f64,
}

impl Default for WeightedStageAggregate {
    fn default() -> Self {
        Self {
            checklist: 0.5,
            reality_check: 0.3,
            precedent: 0.2,
        }
    }
}

impl AggregatePolicy for WeightedStageAggregate {
    fn overall_score(&self, results: &DetailedResults) -> f64 {
        let stages = [
            (self.checklist, Some(results.checklist.score)),
            (self.reality_check, Some(results.reality_check.vacuum_vs_reality_score)),
            (self.precedent, results.precedent.score),
        ];

        let (sum, weights) = stages
            .iter()
            .filter_map(|(weight, score)| score.map(|s| (*weight, s)))
            .fold((0.0, 0.0), |(sum, weights), (weight, score)| {
                (sum + weight * score, weights + weight)
            });

        if weights > 0.0 {
            super::clamp_score(sum / weights)
        } else {
            0.0
        }
    }
}

/// The frozen outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Report identifier.
    pub id: Uuid,
    /// When the report was generated.
    pub validation_timestamp: DateTime<Utc>,
    /// Aggregate score in [0, 10].
    pub overall_validation_score: f64,
    /// Pass/fail gate.
    pub validation_status: ValidationStatus,
    /// BSI score of the read.
    pub bsi_score: BsiScore,
    /// Reasoning patterns detected in the read.
    pub patterns_detected: PatternSet,
    /// Delivered re-path prompts; empty when the BSI passed.
    pub repath_prompts: Vec<RepathPrompt>,
    /// Deduplicated critical issues from the checklist.
    pub critical_issues: Vec<String>,
    /// Concrete next steps.
    pub action_items: Vec<String>,
    /// Observations for improving the scoring and detection policies.
    pub system_learning_points: Vec<String>,
    /// Per-stage results.
    pub detailed_results: DetailedResults,
}

pub(super) struct ReportParts {
    pub overall_validation_score: f64,
    pub bsi_score: BsiScore,
    pub patterns_detected: PatternSet,
    pub repath_prompts: Vec<RepathPrompt>,
    pub detailed_results: DetailedResults,
}

impl ValidationReport {
    pub(super) fn build(parts: ReportParts) -> Self {
        let results = &parts.detailed_results;
        let critical_issues = critical_issues(results);
        let action_items = action_items(&critical_issues, results, !parts.repath_prompts.is_empty());
        let system_learning_points = learning_points(results, parts.bsi_score);

        Self {
            id: Uuid::new_v4(),
            validation_timestamp: Utc::now(),
            overall_validation_score: parts.overall_validation_score,
            validation_status: ValidationStatus::from_score(parts.overall_validation_score),
            bsi_score: parts.bsi_score,
            patterns_detected: parts.patterns_detected,
            repath_prompts: parts.repath_prompts,
            critical_issues,
            action_items,
            system_learning_points,
            detailed_results: parts.detailed_results,
        }
    }

    /// Whether the read passed validation.
    pub fn passed(&self) -> bool {
        self.validation_status == ValidationStatus::Passed
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn critical_issues(results: &DetailedResults) -> Vec<String> {
    let mut issues = Vec::new();
    for check in results.checklist.checks.values() {
        for issue in check.issues_at_least(Severity::Critical) {
            push_unique(&mut issues, issue.description.clone());
        }
    }
    issues
}

fn action_items(
    critical_issues: &[String],
    results: &DetailedResults,
    repath_pending: bool,
) -> Vec<String> {
    let mut items = Vec::new();
    if repath_pending {
        push_unique(
            &mut items,
            "Complete the first 2 re-path prompts before finalizing the read".to_string(),
        );
    }
    for issue in critical_issues {
        push_unique(&mut items, format!("Resolve: {}", issue));
    }
    for action in &results.gaps.remediation_actions {
        push_unique(&mut items, action.clone());
    }
    items
}

fn lesson(item: ChecklistItem) -> &'static str {
    match item {
        ChecklistItem::LogicalConsistency => "Run contradiction detection before finalizing reads",
        ChecklistItem::NarrativeCompleteness => "Narrative development needs a stakes framework",
        ChecklistItem::EvidenceGrounding => {
            "Need better statistical integration in the analysis pipeline"
        }
        ChecklistItem::PredictionSpecificity => {
            "Reasoning chains stall before reaching a specific prediction"
        }
        ChecklistItem::ConfidenceCalibration => "Confidence is being set before evidence is weighed",
    }
}

fn learning_points(results: &DetailedResults, bsi_score: BsiScore) -> Vec<String> {
    let mut points: Vec<String> = results
        .checklist
        .checks
        .iter()
        .filter(|(_, check)| check.score < WEAK_CHECK_SCORE)
        .map(|(item, _)| lesson(*item).to_string())
        .collect();

    if results.reality_check.vacuum_vs_reality_score < REALITY_GAP_THRESHOLD {
        points.push("Reality-checking should happen earlier in the process".to_string());
    }
    if results.precedent.score.is_none() {
        points.push("Historical precedent coverage is missing for this kind of read".to_string());
    }
    if bsi_score.requires_repath() {
        points.push("Low-BSI reads are reaching validation".to_string());
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::validation::{
        ChecklistResult, CheckResult, GapAnalysis, PrecedentResult, RealityCheckResult,
        SourceAssessment,
    };
    use std::collections::BTreeMap;

    fn assessment(score: f64) -> SourceAssessment {
        SourceAssessment {
            score,
            notes: String::new(),
        }
    }

    fn results(checklist: f64, reality: f64, precedent: Option<f64>) -> DetailedResults {
        DetailedResults {
            checklist: ChecklistResult {
                score: checklist,
                checks: BTreeMap::new(),
            },
            reality_check: RealityCheckResult {
                interview_alignment: assessment(reality),
                match_footage_validation: assessment(reality),
                statistical_support: assessment(reality),
                vacuum_vs_reality_score: reality,
                reality_gaps: Vec::new(),
            },
            precedent: PrecedentResult {
                score: precedent,
                ..PrecedentResult::default()
            },
            gaps: GapAnalysis::default(),
        }
    }

    #[test]
    fn test_status_threshold_is_strict() {
        assert_eq!(ValidationStatus::from_score(7.0), ValidationStatus::RequiresRevision);
        assert_eq!(ValidationStatus::from_score(7.01), ValidationStatus::Passed);
        assert_eq!(ValidationStatus::from_score(0.0), ValidationStatus::RequiresRevision);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [ValidationStatus::Passed, ValidationStatus::RequiresRevision] {
            assert_eq!(status.as_str().parse::<ValidationStatus>().unwrap(), status);
        }
        assert!("failed".parse::<ValidationStatus>().is_err());
    }

    #[test]
    fn test_weighted_aggregate_all_stages() {
        let score = WeightedStageAggregate::default().overall_score(&results(8.0, 6.0, Some(7.0)));
        assert!((score - (0.5 * 8.0 + 0.3 * 6.0 + 0.2 * 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_aggregate_renormalizes_without_precedent() {
        let score = WeightedStageAggregate::default().overall_score(&results(8.0, 6.0, None));
        assert!((score - (0.5 * 8.0 + 0.3 * 6.0) / 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_critical_issues_are_deduplicated() {
        let mut detailed = results(5.0, 5.0, None);
        detailed.checklist.checks.insert(
            ChecklistItem::EvidenceGrounding,
            CheckResult::new(4.0)
                .with_issue("No external evidence supports the read", Severity::Critical)
                .with_issue("minor thing", Severity::Minor),
        );
        detailed.checklist.checks.insert(
            ChecklistItem::LogicalConsistency,
            CheckResult::new(2.0)
                .with_issue("No external evidence supports the read", Severity::Critical)
                .with_issue("contradiction", Severity::Critical),
        );

        let issues = critical_issues(&detailed);
        assert_eq!(
            issues,
            vec!["No external evidence supports the read", "contradiction"]
        );
    }

    #[test]
    fn test_action_items_lead_with_repath() {
        let mut detailed = results(5.0, 5.0, None);
        detailed.gaps.remediation_actions = vec!["Fill gaps".to_string()];
        let items = action_items(&["Weak".to_string()], &detailed, true);
        assert_eq!(items.len(), 3);
        assert!(items[0].contains("re-path"));
        assert_eq!(items[1], "Resolve: Weak");
        assert_eq!(items[2], "Fill gaps");
    }

    #[test]
    fn test_learning_points_track_weak_stages() {
        let detailed = results(8.0, 5.0, None);
        let points = learning_points(&detailed, serde_json::from_str("8.0").unwrap());
        assert_eq!(
            points,
            vec![
                "Reality-checking should happen earlier in the process",
                "Historical precedent coverage is missing for this kind of read",
            ]
        );
    }

    #[test]
    fn test_learning_points_flag_low_bsi_reads() {
        let detailed = results(8.0, 8.0, Some(8.0));
        let points = learning_points(&detailed, serde_json::from_str("6.59").unwrap());
        assert_eq!(points, vec!["Low-BSI reads are reaching validation"]);
    }
}
