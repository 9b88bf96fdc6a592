//! Historical precedent stage.
//!
//! Precedent data comes from an external collaborator and is carried
//! through as-is; the only thing computed here is the stage score.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One comparable historical situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecedentMatch {
    /// Short label of the comparable situation.
    pub matchup: String,
    /// Fraction of similar reads that held up, in [0, 1].
    pub historical_accuracy: f64,
}

/// Precedent data for one read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecedentData {
    /// Comparable situations.
    #[serde(default)]
    pub historical_precedents: Vec<PrecedentMatch>,
    /// Narrative patterns shared with history.
    #[serde(default)]
    pub pattern_matches: Vec<String>,
    /// Aggregate accuracy of similar reads, in [0, 1].
    #[serde(default)]
    pub precedent_accuracy: Option<f64>,
    /// Factors that make this case unlike its precedents.
    #[serde(default)]
    pub outlier_factors: Vec<String>,
}

impl PrecedentData {
    /// Whether the data carries anything at all.
    pub fn is_empty(&self) -> bool {
        self.historical_precedents.is_empty()
            && self.pattern_matches.is_empty()
            && self.precedent_accuracy.is_none()
            && self.outlier_factors.is_empty()
    }
}

/// Result of the precedent stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecedentResult {
    /// The data as supplied.
    #[serde(flatten)]
    pub data: PrecedentData,
    /// `precedent_accuracy * 10`; `None` leaves the stage out of the aggregate.
    pub score: Option<f64>,
    /// Set when no usable accuracy figure was available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Build the precedent stage result.
pub fn analyze_precedents(precedents: Option<&PrecedentData>) -> PrecedentResult {
    let Some(data) = precedents else {
        return PrecedentResult {
            notes: Some("No precedent data provided".to_string()),
            ..PrecedentResult::default()
        };
    };

    let score = data
        .precedent_accuracy
        .filter(|a| a.is_finite() && (0.0..=1.0).contains(a))
        .map(|a| a * 10.0);

    let notes = match (score, data.precedent_accuracy) {
        (Some(_), _) => None,
        (None, Some(raw)) => {
            debug!(accuracy = raw, "Ignoring out-of-range precedent accuracy");
            Some(format!("Precedent accuracy {} outside [0, 1]", raw))
        }
        (None, None) => Some("No aggregate precedent accuracy".to_string()),
    };

    PrecedentResult {
        data: data.clone(),
        score,
        notes,
    }
}
