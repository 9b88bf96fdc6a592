//! Gap and backfill analysis.

use serde::{Deserialize, Serialize};

use super::ValidationInput;
use crate::analysis::patterns::{cascade_spread, MAX_CASCADE_SPREAD, MIN_BREATHABILITY};
use crate::analysis::record::Factor;

/// Cascade stages below this completion are weak links.
const WEAK_LINK_COMPLETION: f64 = 50.0;

const MISSING_DATA_ACTION: &str = "Collect the missing data points before re-scoring the read";
const NARRATIVE_ACTION: &str = "Expand the narrative: define the stakes and the historical context";
const CHAIN_ACTION: &str = "Rebuild the weakest reasoning-chain links one step at a time";

/// What the read is missing, and what to do about it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    /// Absent factor scores, evidence sources or cascade data.
    #[serde(default)]
    pub missing_data_points: Vec<String>,
    /// Narrative threads that need development.
    #[serde(default)]
    pub incomplete_narratives: Vec<String>,
    /// Weak links in the reasoning chain.
    #[serde(default)]
    pub weak_factor_chains: Vec<String>,
    /// One remediation per non-empty gap category.
    #[serde(default)]
    pub remediation_actions: Vec<String>,
}

impl GapAnalysis {
    /// Total number of individual gaps.
    pub fn gap_count(&self) -> usize {
        self.missing_data_points.len()
            + self.incomplete_narratives.len()
            + self.weak_factor_chains.len()
    }
}

/// Identify gaps in the read and derive remediation actions.
pub fn analyze_gaps(input: &ValidationInput<'_>) -> GapAnalysis {
    let record = input.record;

    let mut missing_data_points: Vec<String> = record
        .missing_factors()
        .iter()
        .map(|f| format!("Factor score: {}", f))
        .collect();
    missing_data_points.extend(
        input
            .evidence
            .missing_sources()
            .iter()
            .map(|s| format!("Evidence source: {}", s.label())),
    );
    if record.cascade_levels.is_empty() {
        missing_data_points.push("Reasoning cascade levels".to_string());
    }

    let mut incomplete_narratives = Vec::new();
    if record.narrative_text.trim().is_empty() {
        incomplete_narratives.push("No narrative text supplied".to_string());
    }
    match record.factor_if_present(Factor::NarrativeBreathability) {
        Some(score) if score < MIN_BREATHABILITY => incomplete_narratives.push(format!(
            "Narrative breathability at {:.1}, needs {:.1}",
            score, MIN_BREATHABILITY
        )),
        Some(_) => {}
        None => incomplete_narratives.push("Narrative breathability was not scored".to_string()),
    }

    let mut weak_factor_chains: Vec<String> = record
        .completions()
        .iter()
        .enumerate()
        .filter(|(_, c)| **c < WEAK_LINK_COMPLETION)
        .map(|(i, c)| format!("Stage {} at {:.0}% completion", i + 1, c))
        .collect();
    if let Some(spread) = cascade_spread(record).filter(|s| *s > MAX_CASCADE_SPREAD) {
        weak_factor_chains.push(format!(
            "{:.0}-point spread between strongest and weakest stage",
            spread
        ));
    }

    let remediation_actions = [
        (!missing_data_points.is_empty(), MISSING_DATA_ACTION),
        (!incomplete_narratives.is_empty(), NARRATIVE_ACTION),
        (!weak_factor_chains.is_empty(), CHAIN_ACTION),
    ]
    .into_iter()
    .filter(|(needed, _)| *needed)
    .map(|(_, action)| action.to_string())
    .collect();

    GapAnalysis {
        missing_data_points,
        incomplete_narratives,
        weak_factor_chains,
        remediation_actions,
    }
}
