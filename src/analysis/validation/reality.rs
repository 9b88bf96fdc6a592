//! Reality check against external evidence sources.
//!
//! An absent source is never an error: it scores [`NEUTRAL_SOURCE_SCORE`]
//! with a "no data provided" note.

use serde::{Deserialize, Serialize};

use super::{clamp_score, ValidationInput};
use crate::analysis::record::{AnalysisRecord, Factor};

/// Score given to a source that was not supplied.
pub const NEUTRAL_SOURCE_SCORE: f64 = 5.0;

/// Combined reality scores below this attach reality gaps.
pub const REALITY_GAP_THRESHOLD: f64 = 6.0;

/// Belief exceeding the combined reality score by more than this is a gap.
const BELIEF_DIVERGENCE: f64 = 2.0;

/// The external evidence channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Statements made by the subjects.
    Interviews,
    /// Recorded play.
    MatchFootage,
    /// Statistical data.
    Statistics,
}

impl EvidenceSource {
    /// All sources in canonical order.
    pub const ALL: [EvidenceSource; 3] = [
        EvidenceSource::Interviews,
        EvidenceSource::MatchFootage,
        EvidenceSource::Statistics,
    ];

    /// Short human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceSource::Interviews => "interview",
            EvidenceSource::MatchFootage => "footage",
            EvidenceSource::Statistics => "statistical",
        }
    }

    /// Score used when the caller gives no alignment.
    fn default_score(&self) -> f64 {
        match self {
            EvidenceSource::Interviews => 8.0,
            EvidenceSource::MatchFootage => 7.5,
            EvidenceSource::Statistics => 6.5,
        }
    }

    /// Gap named when the source is missing or diverges from the read.
    fn gap(&self) -> &'static str {
        match self {
            EvidenceSource::Interviews => "Mental-state claims made without player statements",
            EvidenceSource::MatchFootage => "Body-language reads not checked against match footage",
            EvidenceSource::Statistics => "Power levels assumed without statistical validation",
        }
    }
}

impl std::fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One piece of external evidence. Opaque to the core apart from an
/// optional caller-supplied alignment score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Free-form description of the evidence.
    pub summary: String,
    /// How well the evidence supports the read, in [0, 10].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<f64>,
}

impl Evidence {
    /// Evidence without an alignment score.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            alignment: None,
        }
    }

    /// Set the alignment score.
    pub fn with_alignment(mut self, alignment: f64) -> Self {
        self.alignment = Some(alignment);
        self
    }
}

/// The optional evidence supplied with a read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSources {
    /// Player or team interviews.
    #[serde(default)]
    pub interviews: Option<Evidence>,
    /// Match footage.
    #[serde(default)]
    pub match_footage: Option<Evidence>,
    /// Statistics.
    #[serde(default)]
    pub statistics: Option<Evidence>,
}

impl EvidenceSources {
    /// Evidence for one source, if supplied.
    pub fn get(&self, source: EvidenceSource) -> Option<&Evidence> {
        match source {
            EvidenceSource::Interviews => self.interviews.as_ref(),
            EvidenceSource::MatchFootage => self.match_footage.as_ref(),
            EvidenceSource::Statistics => self.statistics.as_ref(),
        }
    }

    /// Sources with no evidence.
    pub fn missing_sources(&self) -> Vec<EvidenceSource> {
        EvidenceSource::ALL
            .into_iter()
            .filter(|s| self.get(*s).is_none())
            .collect()
    }
}

/// Score and notes for one evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAssessment {
    /// Score in [0, 10].
    pub score: f64,
    /// What the assessment was based on.
    pub notes: String,
}

/// Pluggable scoring of a supplied evidence source.
///
/// Only called for sources that are present; absent sources always get
/// the neutral score.
pub trait EvidencePolicy: Send + Sync {
    /// Score how well the evidence supports the record.
    fn assess(
        &self,
        source: EvidenceSource,
        evidence: &Evidence,
        record: &AnalysisRecord,
    ) -> SourceAssessment;
}

/// Uses the caller's alignment when given, otherwise a fixed per-source score.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvidencePolicy;

impl EvidencePolicy for DefaultEvidencePolicy {
    fn assess(
        &self,
        source: EvidenceSource,
        evidence: &Evidence,
        _record: &AnalysisRecord,
    ) -> SourceAssessment {
        match evidence.alignment.filter(|a| a.is_finite()) {
            Some(alignment) => SourceAssessment {
                score: clamp_score(alignment),
                notes: format!("Caller-assessed alignment: {}", evidence.summary),
            },
            None => SourceAssessment {
                score: source.default_score(),
                notes: evidence.summary.clone(),
            },
        }
    }
}

/// Result of the reality-check stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealityCheckResult {
    /// Interview alignment.
    pub interview_alignment: SourceAssessment,
    /// Footage validation.
    pub match_footage_validation: SourceAssessment,
    /// Statistical support.
    pub statistical_support: SourceAssessment,
    /// Mean of the three source scores.
    pub vacuum_vs_reality_score: f64,
    /// Divergences between stated belief and evidence, set when the
    /// combined score is below [`REALITY_GAP_THRESHOLD`].
    #[serde(default)]
    pub reality_gaps: Vec<String>,
}

impl RealityCheckResult {
    fn assessment(&self, source: EvidenceSource) -> &SourceAssessment {
        match source {
            EvidenceSource::Interviews => &self.interview_alignment,
            EvidenceSource::MatchFootage => &self.match_footage_validation,
            EvidenceSource::Statistics => &self.statistical_support,
        }
    }
}

fn assess_source(
    policy: &dyn EvidencePolicy,
    source: EvidenceSource,
    input: &ValidationInput<'_>,
) -> SourceAssessment {
    match input.evidence.get(source) {
        Some(evidence) => {
            let mut assessment = policy.assess(source, evidence, input.record);
            assessment.score = clamp_score(assessment.score);
            assessment
        }
        None => SourceAssessment {
            score: NEUTRAL_SOURCE_SCORE,
            notes: format!("No {} data provided", source.label()),
        },
    }
}

/// Run the reality check for one record.
pub fn run_reality_check(
    policy: &dyn EvidencePolicy,
    input: &ValidationInput<'_>,
) -> RealityCheckResult {
    let mut result = RealityCheckResult {
        interview_alignment: assess_source(policy, EvidenceSource::Interviews, input),
        match_footage_validation: assess_source(policy, EvidenceSource::MatchFootage, input),
        statistical_support: assess_source(policy, EvidenceSource::Statistics, input),
        vacuum_vs_reality_score: 0.0,
        reality_gaps: Vec::new(),
    };

    result.vacuum_vs_reality_score = EvidenceSource::ALL
        .iter()
        .map(|s| result.assessment(*s).score)
        .sum::<f64>()
        / EvidenceSource::ALL.len() as f64;

    if result.vacuum_vs_reality_score < REALITY_GAP_THRESHOLD {
        result.reality_gaps = reality_gaps(&result, input);
    }

    result
}

fn reality_gaps(result: &RealityCheckResult, input: &ValidationInput<'_>) -> Vec<String> {
    let mut gaps: Vec<String> = EvidenceSource::ALL
        .iter()
        .filter(|s| {
            input.evidence.get(**s).is_none()
                || result.assessment(**s).score < REALITY_GAP_THRESHOLD
        })
        .map(|s| s.gap().to_string())
        .collect();

    if let Some(belief) = input.record.factor_if_present(Factor::BeliefIntensity) {
        if belief - result.vacuum_vs_reality_score > BELIEF_DIVERGENCE {
            gaps.push(format!(
                "Belief intensity {:.1} exceeds evidence support {:.1}",
                belief, result.vacuum_vs_reality_score
            ));
        }
    }

    gaps
}
