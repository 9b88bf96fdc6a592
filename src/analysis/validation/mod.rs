//! Multi-stage validation loop.
//!
//! Stages run strictly in order for one record:
//!
//! ```text
//! checklist → reality check → precedent analysis → gap analysis → report
//! ```
//!
//! Each stage returns its own result; the results are threaded forward and
//! frozen into [`DetailedResults`] only once the last stage has finished, so
//! no partial report is ever observable. Scoring at every stage goes through
//! pluggable policies ([`CheckPolicy`], [`EvidencePolicy`], [`AggregatePolicy`]).

mod checklist;
mod gaps;
mod precedent;
mod reality;
mod report;

pub use checklist::*;
pub use gaps::*;
pub use precedent::*;
pub use reality::*;
pub use report::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::patterns::detect_patterns;
use super::record::{AnalysisRecord, ContradictionFlag, MAX_FACTOR_SCORE};
use super::repath::generate;
use super::score::calculate_bsi;

/// How much an issue matters for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth mentioning.
    Minor,
    /// Should be addressed before the read is relied on.
    Major,
    /// Must be addressed; surfaces in the report's critical issues.
    Critical,
}

/// A specific problem found by a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// What is wrong.
    pub description: String,
    /// How much it matters.
    pub severity: Severity,
}

/// Output of one scoring policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Score in [0, 10].
    pub score: f64,
    /// Specific issues or gaps behind the score.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl CheckResult {
    /// Create a result. The score is clamped to [0, 10]; NaN becomes 0.
    pub fn new(score: f64) -> Self {
        Self {
            score: clamp_score(score),
            issues: Vec::new(),
        }
    }

    /// Attach an issue.
    pub fn with_issue(mut self, description: impl Into<String>, severity: Severity) -> Self {
        self.issues.push(Issue {
            description: description.into(),
            severity,
        });
        self
    }

    /// Issues at the given severity or above.
    pub fn issues_at_least(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity >= severity)
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_FACTOR_SCORE)
    }
}

/// Names of the validation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    /// Five weighted sub-checks.
    Checklist,
    /// Comparison against external evidence.
    RealityCheck,
    /// Historical precedent analysis.
    Precedent,
    /// Gap and backfill analysis.
    Gaps,
}

impl ValidationStage {
    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStage::Checklist => "checklist",
            ValidationStage::RealityCheck => "reality_check",
            ValidationStage::Precedent => "precedent",
            ValidationStage::Gaps => "gaps",
        }
    }
}

impl std::fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static NO_EVIDENCE: EvidenceSources = EvidenceSources {
    interviews: None,
    match_footage: None,
    statistics: None,
};

/// Everything a validation run reads. Never mutated by the loop.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    /// The read under evaluation.
    pub record: &'a AnalysisRecord,
    /// Flags from the contradiction detector.
    pub contradictions: &'a [ContradictionFlag],
    /// Optional external evidence.
    pub evidence: &'a EvidenceSources,
    /// Optional historical precedent data.
    pub precedents: Option<&'a PrecedentData>,
}

impl<'a> ValidationInput<'a> {
    /// Input with no flags, evidence or precedent data.
    pub fn new(record: &'a AnalysisRecord) -> Self {
        Self {
            record,
            contradictions: &[],
            evidence: &NO_EVIDENCE,
            precedents: None,
        }
    }

    /// Set the contradiction flags.
    pub fn with_contradictions(mut self, contradictions: &'a [ContradictionFlag]) -> Self {
        self.contradictions = contradictions;
        self
    }

    /// Set the evidence sources.
    pub fn with_evidence(mut self, evidence: &'a EvidenceSources) -> Self {
        self.evidence = evidence;
        self
    }

    /// Set the precedent data.
    pub fn with_precedents(mut self, precedents: Option<&'a PrecedentData>) -> Self {
        self.precedents = precedents;
        self
    }
}

/// Per-stage results of one run, keyed by stage name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedResults {
    /// Checklist stage.
    pub checklist: ChecklistResult,
    /// Reality-check stage.
    pub reality_check: RealityCheckResult,
    /// Precedent stage.
    pub precedent: PrecedentResult,
    /// Gap analysis stage.
    pub gaps: GapAnalysis,
}

/// The validation loop with its scoring policies.
///
/// Policies are shared behind `Arc`, so one loop can validate many records
/// concurrently; each [`run`](Self::run) owns its own stage results.
#[derive(Clone)]
pub struct ValidationLoop {
    checklist: Checklist,
    evidence_policy: Arc<dyn EvidencePolicy>,
    aggregate_policy: Arc<dyn AggregatePolicy>,
}

impl Default for ValidationLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationLoop")
            .field("checklist", &self.checklist)
            .finish_non_exhaustive()
    }
}

impl ValidationLoop {
    /// Loop with the default policies.
    pub fn new() -> Self {
        Self {
            checklist: Checklist::default(),
            evidence_policy: Arc::new(DefaultEvidencePolicy),
            aggregate_policy: Arc::new(WeightedStageAggregate::default()),
        }
    }

    /// Replace the checklist.
    pub fn with_checklist(mut self, checklist: Checklist) -> Self {
        self.checklist = checklist;
        self
    }

    /// Replace the evidence scoring policy.
    pub fn with_evidence_policy(mut self, policy: Arc<dyn EvidencePolicy>) -> Self {
        self.evidence_policy = policy;
        self
    }

    /// Replace the aggregate scoring policy.
    pub fn with_aggregate_policy(mut self, policy: Arc<dyn AggregatePolicy>) -> Self {
        self.aggregate_policy = policy;
        self
    }

    /// Run every stage in order and produce the final report.
    pub fn run(&self, input: &ValidationInput<'_>) -> ValidationReport {
        let checklist = self.checklist.run(input);
        info!(
            stage = %ValidationStage::Checklist,
            score = checklist.score,
            "Validation stage complete"
        );

        let reality_check = run_reality_check(self.evidence_policy.as_ref(), input);
        info!(
            stage = %ValidationStage::RealityCheck,
            score = reality_check.vacuum_vs_reality_score,
            gaps = reality_check.reality_gaps.len(),
            "Validation stage complete"
        );

        let precedent = analyze_precedents(input.precedents);
        info!(
            stage = %ValidationStage::Precedent,
            score = ?precedent.score,
            "Validation stage complete"
        );

        let gaps = analyze_gaps(input);
        info!(
            stage = %ValidationStage::Gaps,
            actions = gaps.remediation_actions.len(),
            "Validation stage complete"
        );

        let results = DetailedResults {
            checklist,
            reality_check,
            precedent,
            gaps,
        };

        let bsi_score = calculate_bsi(input.record);
        let patterns = detect_patterns(input.record, input.contradictions);
        let prompts = if bsi_score.requires_repath() {
            generate(&patterns)
        } else {
            Vec::new()
        };
        debug!(bsi = %bsi_score, patterns = %patterns, "Embedding re-path summary in report");

        let overall = self.aggregate_policy.overall_score(&results);
        ValidationReport::build(ReportParts {
            overall_validation_score: overall,
            bsi_score,
            patterns_detected: patterns,
            repath_prompts: prompts,
            detailed_results: results,
        })
    }
}
