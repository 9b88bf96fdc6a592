//! The read under evaluation and the contradiction flags raised against it.
//!
//! [`AnalysisRecord`] deserializes from any JSON value without failing:
//! missing, malformed or out-of-range entries are dropped and later read
//! back through their documented defaults (0 for a factor, empty for the
//! cascade). Both the nested producer shape
//! (`intuitive_weighting.strength_factors.<factor>.score`,
//! `in_game_cascade.cascade_levels[].completion`) and the flat shape this
//! type serializes to are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound of a factor score.
pub const MAX_FACTOR_SCORE: f64 = 10.0;

/// Upper bound of a cascade completion percentage.
pub const MAX_COMPLETION: f64 = 100.0;

/// The fixed set of strength factors scored on a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// How well the read's symbols and motifs line up.
    SymbolicAlignment,
    /// Strength of the author's conviction.
    BeliefIntensity,
    /// Emotional charge of the read.
    SentimentIntensity,
    /// How fully developed the narrative explanation is.
    NarrativeBreathability,
}

impl Factor {
    /// All factors, in canonical order.
    pub const ALL: [Factor; 4] = [
        Factor::SymbolicAlignment,
        Factor::BeliefIntensity,
        Factor::SentimentIntensity,
        Factor::NarrativeBreathability,
    ];

    /// Get the factor name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::SymbolicAlignment => "symbolic_alignment",
            Factor::BeliefIntensity => "belief_intensity",
            Factor::SentimentIntensity => "sentiment_intensity",
            Factor::NarrativeBreathability => "narrative_breathability",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "symbolic_alignment" => Ok(Factor::SymbolicAlignment),
            "belief_intensity" => Ok(Factor::BeliefIntensity),
            "sentiment_intensity" => Ok(Factor::SentimentIntensity),
            "narrative_breathability" => Ok(Factor::NarrativeBreathability),
            _ => Err(format!("Unknown factor: {}", s)),
        }
    }
}

/// One stage of the multi-step reasoning chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeLevel {
    /// Completion percentage in [0, 100].
    pub completion: f64,
}

/// A read together with its structured analysis data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct AnalysisRecord {
    /// Factor scores in [0, 10]; absent factors are simply not present.
    pub factor_scores: BTreeMap<Factor, f64>,
    /// Ordered completion of each reasoning-chain stage.
    pub cascade_levels: Vec<CascadeLevel>,
    /// The raw read. Opaque to scoring; only the contradiction detector reads it.
    pub narrative_text: String,
}

impl AnalysisRecord {
    /// Create an empty record around a narrative.
    pub fn new(narrative_text: impl Into<String>) -> Self {
        Self {
            narrative_text: narrative_text.into(),
            ..Self::default()
        }
    }

    /// Set a factor score. Values outside [0, 10] are treated as missing.
    pub fn with_factor(mut self, factor: Factor, score: f64) -> Self {
        match valid_factor_score(score) {
            Some(score) => {
                self.factor_scores.insert(factor, score);
            }
            None => {
                debug!(factor = %factor, score, "Dropping out-of-range factor score");
                self.factor_scores.remove(&factor);
            }
        }
        self
    }

    /// Replace the cascade with the given completion percentages.
    ///
    /// Out-of-range completions default to 0.
    pub fn with_cascade(mut self, completions: impl IntoIterator<Item = f64>) -> Self {
        self.cascade_levels = completions
            .into_iter()
            .map(|c| CascadeLevel {
                completion: valid_completion(c).unwrap_or(0.0),
            })
            .collect();
        self
    }

    /// Score of a factor, 0 when absent.
    pub fn factor(&self, factor: Factor) -> f64 {
        self.factor_scores.get(&factor).copied().unwrap_or(0.0)
    }

    /// Score of a factor only if it was actually supplied.
    pub fn factor_if_present(&self, factor: Factor) -> Option<f64> {
        self.factor_scores.get(&factor).copied()
    }

    /// Factors with no supplied score.
    pub fn missing_factors(&self) -> Vec<Factor> {
        Factor::ALL
            .into_iter()
            .filter(|f| !self.factor_scores.contains_key(f))
            .collect()
    }

    /// Completion percentages in chain order.
    pub fn completions(&self) -> Vec<f64> {
        self.cascade_levels.iter().map(|l| l.completion).collect()
    }

    /// Build a record from any JSON value, never failing.
    pub fn from_value(value: &Value) -> Self {
        let factors = value
            .pointer("/intuitive_weighting/strength_factors")
            .or_else(|| value.get("factor_scores"));
        let cascade = value
            .pointer("/in_game_cascade/cascade_levels")
            .or_else(|| value.get("cascade_levels"));

        let mut factor_scores = BTreeMap::new();
        if let Some(Value::Object(entries)) = factors {
            for (name, entry) in entries {
                let Ok(factor) = name.parse::<Factor>() else {
                    debug!(factor = %name, "Ignoring unknown factor");
                    continue;
                };
                // Nested shape carries {"score": x}; flat shape carries x.
                let raw = entry.get("score").unwrap_or(entry);
                if let Some(score) = raw.as_f64().and_then(valid_factor_score) {
                    factor_scores.insert(factor, score);
                }
            }
        }

        let cascade_levels = match cascade {
            Some(Value::Array(levels)) => levels
                .iter()
                .map(|level| CascadeLevel {
                    completion: level
                        .get("completion")
                        .and_then(Value::as_f64)
                        .and_then(valid_completion)
                        .unwrap_or(0.0),
                })
                .collect(),
            _ => Vec::new(),
        };

        let narrative_text = value
            .get("narrative_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            factor_scores,
            cascade_levels,
            narrative_text,
        }
    }
}

impl From<Value> for AnalysisRecord {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

fn valid_factor_score(score: f64) -> Option<f64> {
    (score.is_finite() && (0.0..=MAX_FACTOR_SCORE).contains(&score)).then_some(score)
}

fn valid_completion(completion: f64) -> Option<f64> {
    (completion.is_finite() && (0.0..=MAX_COMPLETION).contains(&completion)).then_some(completion)
}

// ============================================================================
// Contradiction flags
// ============================================================================

/// Category of an internal contradiction found in a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionPattern {
    /// The expected outcome conflicts with the conditions described.
    ExpectationVsConditionMismatch,
    /// A paradox is named but never explored.
    ParadoxWithoutExploration,
    /// A significant factor is noted but carries no weight in the conclusion.
    PowerFactorWithoutWeight,
    /// A core strength is framed as a weakness without reasoning.
    FundamentalTraitVsArbitraryLimitation,
}

impl ContradictionPattern {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ContradictionPattern::ExpectationVsConditionMismatch => {
                "Expectation-vs-Condition Mismatch"
            }
            ContradictionPattern::ParadoxWithoutExploration => "Paradox-Without-Exploration",
            ContradictionPattern::PowerFactorWithoutWeight => "Power-Factor-Without-Weight",
            ContradictionPattern::FundamentalTraitVsArbitraryLimitation => {
                "Fundamental-Trait-vs-Arbitrary-Limitation"
            }
        }
    }
}

impl std::fmt::Display for ContradictionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ContradictionPattern {
    type Err = String;

    /// Accepts labels, the detector's long names and snake_case, ignoring
    /// case and punctuation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "expectationvsconditionmismatch" => {
                Ok(ContradictionPattern::ExpectationVsConditionMismatch)
            }
            "paradoxwithoutexploration" | "paradoxidentificationwithoutexploration" => {
                Ok(ContradictionPattern::ParadoxWithoutExploration)
            }
            "powerfactorwithoutweight" | "powerfactorwithoutweightassignment" => {
                Ok(ContradictionPattern::PowerFactorWithoutWeight)
            }
            "fundamentaltraitvsarbitrarylimitation" => {
                Ok(ContradictionPattern::FundamentalTraitVsArbitraryLimitation)
            }
            _ => Err(format!("Unknown contradiction pattern: {}", s)),
        }
    }
}

/// One finding from the contradiction detector. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionFlag {
    /// The conflicting statements, quoted or paraphrased.
    pub statement: String,
    /// Which contradiction category the finding belongs to.
    pub pattern: ContradictionPattern,
    /// Question that forces the author to confront the inconsistency.
    pub challenge: String,
}

impl ContradictionFlag {
    /// Create a new flag
    pub fn new(
        statement: impl Into<String>,
        pattern: ContradictionPattern,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            pattern,
            challenge: challenge.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_factor_round_trips_through_str() {
        for factor in Factor::ALL {
            assert_eq!(factor.as_str().parse::<Factor>().unwrap(), factor);
        }
        assert!("grit".parse::<Factor>().is_err());
    }

    #[test]
    fn test_from_nested_producer_shape() {
        let value = json!({
            "intuitive_weighting": {
                "strength_factors": {
                    "symbolic_alignment": {"score": 6.5},
                    "belief_intensity": {"score": 7.2},
                    "sentiment_intensity": {"score": 6.8},
                    "narrative_breathability": {"score": 5.9}
                }
            },
            "in_game_cascade": {
                "cascade_levels": [
                    {"completion": 75}, {"completion": 45}, {"completion": 60}, {"completion": 30}
                ]
            },
            "narrative_text": "anisimova vs sabalenka"
        });

        let record = AnalysisRecord::from_value(&value);
        assert_eq!(record.factor(Factor::BeliefIntensity), 7.2);
        assert_eq!(record.factor(Factor::NarrativeBreathability), 5.9);
        assert_eq!(record.completions(), vec![75.0, 45.0, 60.0, 30.0]);
        assert_eq!(record.narrative_text, "anisimova vs sabalenka");
        assert!(record.missing_factors().is_empty());
    }

    #[test]
    fn test_from_flat_shape() {
        let value = json!({
            "factor_scores": {"belief_intensity": 8.0},
            "cascade_levels": [{"completion": 10}],
            "narrative_text": "x"
        });
        let record: AnalysisRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.factor(Factor::BeliefIntensity), 8.0);
        assert_eq!(record.completions(), vec![10.0]);
    }

    #[test]
    fn test_serialize_then_deserialize_preserves_record() {
        let record = AnalysisRecord::new("read")
            .with_factor(Factor::SymbolicAlignment, 4.0)
            .with_cascade([20.0, 90.0]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["factor_scores"]["symbolic_alignment"], 4.0);
        let back: AnalysisRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_data_defaults() {
        let record = AnalysisRecord::from_value(&json!({}));
        for factor in Factor::ALL {
            assert_eq!(record.factor(factor), 0.0);
            assert!(record.factor_if_present(factor).is_none());
        }
        assert!(record.cascade_levels.is_empty());
        assert!(record.narrative_text.is_empty());
        assert_eq!(record.missing_factors().len(), 4);
    }

    #[test]
    fn test_malformed_entries_treated_as_missing() {
        let value = json!({
            "intuitive_weighting": {
                "strength_factors": {
                    "symbolic_alignment": {"score": 14.0},
                    "belief_intensity": {"score": "high"},
                    "sentiment_intensity": {},
                    "narrative_breathability": {"score": -1},
                    "gut_feel": {"score": 9.0}
                }
            },
            "in_game_cascade": {
                "cascade_levels": [{"completion": 80}, {}, {"completion": 250}, {"stage": "late"}]
            }
        });

        let record = AnalysisRecord::from_value(&value);
        assert!(record.factor_scores.is_empty());
        assert_eq!(record.completions(), vec![80.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_object_input_yields_empty_record() {
        let record: AnalysisRecord = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(record, AnalysisRecord::default());
    }

    #[test]
    fn test_with_factor_rejects_out_of_range() {
        let record = AnalysisRecord::default()
            .with_factor(Factor::BeliefIntensity, 6.0)
            .with_factor(Factor::BeliefIntensity, 11.0);
        assert!(record.factor_if_present(Factor::BeliefIntensity).is_none());

        let record = AnalysisRecord::default().with_factor(Factor::BeliefIntensity, f64::NAN);
        assert!(record.factor_scores.is_empty());
    }

    #[test]
    fn test_contradiction_pattern_parsing_variants() {
        let cases = [
            ("Expectation vs. Condition Mismatch", ContradictionPattern::ExpectationVsConditionMismatch),
            ("Expectation-vs-Condition Mismatch", ContradictionPattern::ExpectationVsConditionMismatch),
            ("Paradox Identification Without Exploration", ContradictionPattern::ParadoxWithoutExploration),
            ("paradox_without_exploration", ContradictionPattern::ParadoxWithoutExploration),
            ("Power Factor Without Weight Assignment", ContradictionPattern::PowerFactorWithoutWeight),
            ("Power-Factor-Without-Weight", ContradictionPattern::PowerFactorWithoutWeight),
            ("Fundamental Trait vs. Arbitrary Limitation", ContradictionPattern::FundamentalTraitVsArbitraryLimitation),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<ContradictionPattern>().unwrap(), expected, "{}", input);
        }
        assert!("Recency Bias".parse::<ContradictionPattern>().is_err());
    }

    #[test]
    fn test_contradiction_pattern_label_parses_back() {
        for pattern in [
            ContradictionPattern::ExpectationVsConditionMismatch,
            ContradictionPattern::ParadoxWithoutExploration,
            ContradictionPattern::PowerFactorWithoutWeight,
            ContradictionPattern::FundamentalTraitVsArbitraryLimitation,
        ] {
            assert_eq!(pattern.label().parse::<ContradictionPattern>().unwrap(), pattern);
        }
    }

    #[test]
    fn test_contradiction_flag_serialize() {
        let flag = ContradictionFlag::new(
            "Power assessment contradiction",
            ContradictionPattern::PowerFactorWithoutWeight,
            "Which power edge actually decides rallies?",
        );
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("\"pattern\":\"power_factor_without_weight\""));
    }
}
