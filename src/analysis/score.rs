//! BSI (belief/strength index) scoring.
//!
//! The composite is a fixed-weight linear combination of the four factor
//! scores. Narrative breathability and belief intensity carry the most
//! weight. The result is not clamped; callers compare it against
//! [`BSI_THRESHOLD`].

use serde::{Deserialize, Serialize};

use super::record::{AnalysisRecord, Factor};

/// A read scoring below this needs the re-path protocol.
pub const BSI_THRESHOLD: f64 = 7.0;

/// Factor weights. Must sum to 1.0.
pub const BSI_WEIGHTS: [(Factor, f64); 4] = [
    (Factor::SymbolicAlignment, weight_of(Factor::SymbolicAlignment)),
    (Factor::BeliefIntensity, weight_of(Factor::BeliefIntensity)),
    (Factor::SentimentIntensity, weight_of(Factor::SentimentIntensity)),
    (Factor::NarrativeBreathability, weight_of(Factor::NarrativeBreathability)),
];

/// Composite strength score of a read, nominally in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BsiScore(f64);

impl BsiScore {
    /// Raw score value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether the score falls below the acceptance threshold.
    pub fn requires_repath(&self) -> bool {
        self.0 < BSI_THRESHOLD
    }
}

impl std::fmt::Display for BsiScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}/10", self.0)
    }
}

/// Weight applied to a factor in the composite.
pub const fn weight_of(factor: Factor) -> f64 {
    match factor {
        Factor::SymbolicAlignment => 0.2,
        Factor::BeliefIntensity => 0.3,
        Factor::SentimentIntensity => 0.2,
        Factor::NarrativeBreathability => 0.3,
    }
}

/// Compute the BSI score of a record. Absent factors contribute 0.
pub fn calculate_bsi(record: &AnalysisRecord) -> BsiScore {
    let score = BSI_WEIGHTS
        .iter()
        .map(|&(factor, weight)| weight * record.factor(factor))
        .sum();
    BsiScore(score)
}
