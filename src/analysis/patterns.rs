//! Detection of low-flexibility reasoning patterns.
//!
//! Each rule is evaluated independently; a record can trigger anywhere
//! from zero to all four patterns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::record::{AnalysisRecord, ContradictionFlag, Factor};

/// More flags than this means a high contradiction count.
pub const MAX_CONTRADICTIONS: usize = 2;

/// Spread (percentage points) between best and worst cascade stage above
/// which the chain is uneven.
pub const MAX_CASCADE_SPREAD: f64 = 40.0;

/// Narrative breathability below this marks an incomplete narrative.
pub const MIN_BREATHABILITY: f64 = 6.5;

/// Factor scores below this are extreme.
pub const EXTREME_LOW: f64 = 3.0;

/// Factor scores above this are extreme.
pub const EXTREME_HIGH: f64 = 9.0;

/// This many extreme factors indicate binary thinking.
pub const MIN_EXTREME_FACTORS: usize = 2;

/// A reasoning-quality failure pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningPattern {
    /// More than two contradiction flags were raised.
    HighContradictionCount,
    /// Later reasoning stages are far less developed than earlier ones.
    UnevenReasoningChain,
    /// Narrative breathability is low or absent.
    IncompleteNarrative,
    /// Several factors sit at the extremes of the scale.
    BinaryThinking,
}

impl ReasoningPattern {
    /// Get the pattern tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningPattern::HighContradictionCount => "high_contradiction_count",
            ReasoningPattern::UnevenReasoningChain => "uneven_reasoning_chain",
            ReasoningPattern::IncompleteNarrative => "incomplete_narrative",
            ReasoningPattern::BinaryThinking => "binary_thinking",
        }
    }
}

impl std::fmt::Display for ReasoningPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A duplicate-free set of detected patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(BTreeSet<ReasoningPattern>);

impl PatternSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern; duplicates are ignored.
    pub fn insert(&mut self, pattern: ReasoningPattern) {
        self.0.insert(pattern);
    }

    /// Whether the pattern was detected.
    pub fn contains(&self, pattern: ReasoningPattern) -> bool {
        self.0.contains(&pattern)
    }

    /// Whether any of the given patterns was detected.
    pub fn contains_any(&self, patterns: &[ReasoningPattern]) -> bool {
        patterns.iter().any(|p| self.0.contains(p))
    }

    /// Number of detected patterns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate detected patterns.
    pub fn iter(&self) -> impl Iterator<Item = ReasoningPattern> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ReasoningPattern> for PatternSet {
    fn from_iter<I: IntoIterator<Item = ReasoningPattern>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for PatternSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tags: Vec<&str> = self.0.iter().map(|p| p.as_str()).collect();
        write!(f, "{}", tags.join(", "))
    }
}

/// Detect low-flexibility patterns in a record.
pub fn detect_patterns(record: &AnalysisRecord, flags: &[ContradictionFlag]) -> PatternSet {
    let mut patterns = PatternSet::new();

    if flags.len() > MAX_CONTRADICTIONS {
        patterns.insert(ReasoningPattern::HighContradictionCount);
    }

    if let Some(spread) = cascade_spread(record) {
        if spread > MAX_CASCADE_SPREAD {
            patterns.insert(ReasoningPattern::UnevenReasoningChain);
        }
    }

    // Absent breathability reads as 0: missing narrative data is itself
    // evidence of an incomplete narrative.
    if record.factor(Factor::NarrativeBreathability) < MIN_BREATHABILITY {
        patterns.insert(ReasoningPattern::IncompleteNarrative);
    }

    if extreme_factor_count(record) >= MIN_EXTREME_FACTORS {
        patterns.insert(ReasoningPattern::BinaryThinking);
    }

    debug!(
        flags = flags.len(),
        patterns = %patterns,
        "Reasoning pattern detection complete"
    );

    patterns
}

/// Spread between most and least complete cascade stage, if any stages exist.
pub fn cascade_spread(record: &AnalysisRecord) -> Option<f64> {
    let completions = record.completions();
    if completions.is_empty() {
        return None;
    }
    let max = completions.iter().copied().fold(f64::MIN, f64::max);
    let min = completions.iter().copied().fold(f64::MAX, f64::min);
    Some(max - min)
}

/// Number of supplied factor scores at either extreme of the scale.
///
/// Absent factors are not counted.
pub fn extreme_factor_count(record: &AnalysisRecord) -> usize {
    Factor::ALL
        .iter()
        .filter_map(|&f| record.factor_if_present(f))
        .filter(|&score| score < EXTREME_LOW || score > EXTREME_HIGH)
        .count()
}
