//! Re-path prompt generation and the re-path protocol.
//!
//! Generation happens in two phases. The candidate phase maps every
//! detected pattern to its dedicated prompt, adds the conditional
//! observation and evidence prompts, and always appends a state reset.
//! The delivery phase walks [`PRIORITY_ORDER`] and keeps the candidate
//! matching each entry.
//!
//! `eyes_never_lie_check` and `reality_anchor` are not in the priority
//! list, so they are generated but never delivered. This is the long
//! standing behaviour and is kept until a product decision says
//! otherwise; [`PromptPlan::dropped`] exposes what was filtered.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::patterns::{detect_patterns, PatternSet, ReasoningPattern};
use super::record::{AnalysisRecord, ContradictionFlag};
use super::score::{calculate_bsi, BsiScore};
use crate::prompts::{
    CONTRADICTION_RESOLUTION_TEXT, EYES_NEVER_LIE_TEXT, NARRATIVE_EXPANSION_TEXT,
    NUANCE_INJECTION_TEXT, REALITY_ANCHOR_TEXT, REASONING_CHAIN_TEXT, STATE_RESET_TEXT,
};

/// Advice attached to every outcome that requires a re-path.
pub const REPATH_RECOMMENDATION: &str =
    "Complete at least the first 2 prompts before finalizing analysis";

/// Status attached to outcomes that pass the BSI threshold.
pub const ACCEPTABLE_STATUS: &str = "Analysis quality acceptable";

/// Delivery order. Candidate types missing from this list are dropped.
pub const PRIORITY_ORDER: [PromptType; 5] = [
    PromptType::StateReset,
    PromptType::ContradictionResolution,
    PromptType::NarrativeExpansion,
    PromptType::ReasoningChain,
    PromptType::NuanceInjection,
];

/// Kind of corrective prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    ContradictionResolution,
    ReasoningChain,
    NarrativeExpansion,
    NuanceInjection,
    EyesNeverLieCheck,
    RealityAnchor,
    StateReset,
}

impl PromptType {
    /// Get the prompt type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::ContradictionResolution => "contradiction_resolution",
            PromptType::ReasoningChain => "reasoning_chain",
            PromptType::NarrativeExpansion => "narrative_expansion",
            PromptType::NuanceInjection => "nuance_injection",
            PromptType::EyesNeverLieCheck => "eyes_never_lie_check",
            PromptType::RealityAnchor => "reality_anchor",
            PromptType::StateReset => "state_reset",
        }
    }

    /// The dedicated prompt for a detected pattern.
    pub fn for_pattern(pattern: ReasoningPattern) -> Self {
        match pattern {
            ReasoningPattern::HighContradictionCount => PromptType::ContradictionResolution,
            ReasoningPattern::UnevenReasoningChain => PromptType::ReasoningChain,
            ReasoningPattern::IncompleteNarrative => PromptType::NarrativeExpansion,
            ReasoningPattern::BinaryThinking => PromptType::NuanceInjection,
        }
    }

    fn text(&self) -> &'static str {
        match self {
            PromptType::ContradictionResolution => CONTRADICTION_RESOLUTION_TEXT,
            PromptType::ReasoningChain => REASONING_CHAIN_TEXT,
            PromptType::NarrativeExpansion => NARRATIVE_EXPANSION_TEXT,
            PromptType::NuanceInjection => NUANCE_INJECTION_TEXT,
            PromptType::EyesNeverLieCheck => EYES_NEVER_LIE_TEXT,
            PromptType::RealityAnchor => REALITY_ANCHOR_TEXT,
            PromptType::StateReset => STATE_RESET_TEXT,
        }
    }

    fn focus(&self) -> PromptFocus {
        match self {
            PromptType::ContradictionResolution => PromptFocus::LogicalConsistency,
            PromptType::ReasoningChain => PromptFocus::SequentialLogic,
            PromptType::NarrativeExpansion => PromptFocus::NarrativeDepth,
            PromptType::NuanceInjection => PromptFocus::DimensionalThinking,
            PromptType::EyesNeverLieCheck => PromptFocus::DirectObservation,
            PromptType::RealityAnchor => PromptFocus::EvidenceGrounding,
            PromptType::StateReset => PromptFocus::IntuitiveReset,
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a prompt asks the author to work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptFocus {
    LogicalConsistency,
    SequentialLogic,
    NarrativeDepth,
    DimensionalThinking,
    DirectObservation,
    EvidenceGrounding,
    IntuitiveReset,
}

/// A corrective prompt for the author of a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepathPrompt {
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub text: String,
    pub focus: PromptFocus,
}

impl RepathPrompt {
    /// Build the fixed prompt for a type.
    pub fn of(prompt_type: PromptType) -> Self {
        Self {
            prompt_type,
            text: prompt_type.text().to_string(),
            focus: prompt_type.focus(),
        }
    }
}

/// Both generation phases side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptPlan {
    /// Everything the candidate phase produced, in generation order.
    pub candidates: Vec<RepathPrompt>,
    /// What the caller receives, in priority order.
    pub delivered: Vec<RepathPrompt>,
    /// Candidate types the priority filter removed.
    pub dropped: Vec<PromptType>,
}

/// Candidate phase: one prompt per pattern, conditional extras, state reset last.
pub fn generate_candidates(patterns: &PatternSet) -> Vec<RepathPrompt> {
    // Fixed pattern order keeps generation deterministic.
    let mut prompts: Vec<RepathPrompt> = [
        ReasoningPattern::HighContradictionCount,
        ReasoningPattern::UnevenReasoningChain,
        ReasoningPattern::IncompleteNarrative,
        ReasoningPattern::BinaryThinking,
    ]
    .into_iter()
    .filter(|&p| patterns.contains(p))
    .map(|p| RepathPrompt::of(PromptType::for_pattern(p)))
    .collect();

    if patterns.contains_any(&[
        ReasoningPattern::IncompleteNarrative,
        ReasoningPattern::BinaryThinking,
    ]) {
        prompts.push(RepathPrompt::of(PromptType::EyesNeverLieCheck));
    }

    if patterns.contains_any(&[
        ReasoningPattern::HighContradictionCount,
        ReasoningPattern::BinaryThinking,
    ]) {
        prompts.push(RepathPrompt::of(PromptType::RealityAnchor));
    }

    prompts.push(RepathPrompt::of(PromptType::StateReset));
    prompts
}

/// Delivery phase: reorder candidates by [`PRIORITY_ORDER`].
pub fn prioritize(candidates: &[RepathPrompt]) -> Vec<RepathPrompt> {
    PRIORITY_ORDER
        .iter()
        .filter_map(|&priority| candidates.iter().find(|c| c.prompt_type == priority))
        .cloned()
        .collect()
}

/// Run both phases and report what was filtered out.
pub fn plan_prompts(patterns: &PatternSet) -> PromptPlan {
    let candidates = generate_candidates(patterns);
    let delivered = prioritize(&candidates);
    let dropped: Vec<PromptType> = candidates
        .iter()
        .map(|c| c.prompt_type)
        .filter(|t| !PRIORITY_ORDER.contains(t))
        .collect();

    if !dropped.is_empty() {
        debug!(
            dropped = ?dropped,
            "Generated prompts outside the priority list were not delivered"
        );
    }

    PromptPlan {
        candidates,
        delivered,
        dropped,
    }
}

/// Delivered prompt sequence for a pattern set.
pub fn generate(patterns: &PatternSet) -> Vec<RepathPrompt> {
    plan_prompts(patterns).delivered
}

// ============================================================================
// Re-path protocol
// ============================================================================

/// Result of running the re-path protocol on a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepathOutcome {
    pub repath_required: bool,
    pub bsi_score: BsiScore,
    #[serde(default)]
    pub patterns_detected: PatternSet,
    #[serde(default)]
    pub prompts: Vec<RepathPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Scores a read and builds its re-path plan when it falls below the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepathProtocol;

impl RepathProtocol {
    /// Run the protocol on one read.
    pub fn execute(record: &AnalysisRecord, flags: &[ContradictionFlag]) -> RepathOutcome {
        let bsi_score = calculate_bsi(record);

        if !bsi_score.requires_repath() {
            info!(bsi = %bsi_score, "BSI acceptable, no re-path needed");
            return RepathOutcome {
                repath_required: false,
                bsi_score,
                patterns_detected: PatternSet::new(),
                prompts: Vec::new(),
                recommendation: None,
                status: Some(ACCEPTABLE_STATUS.to_string()),
            };
        }

        let patterns = detect_patterns(record, flags);
        let prompts = generate(&patterns);

        info!(
            bsi = %bsi_score,
            patterns = %patterns,
            prompts = prompts.len(),
            "Low BSI detected, re-path protocol initiated"
        );

        RepathOutcome {
            repath_required: true,
            bsi_score,
            patterns_detected: patterns,
            prompts,
            recommendation: Some(REPATH_RECOMMENDATION.to_string()),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::Factor;

    const ALL_PATTERNS: [ReasoningPattern; 4] = [
        ReasoningPattern::HighContradictionCount,
        ReasoningPattern::UnevenReasoningChain,
        ReasoningPattern::IncompleteNarrative,
        ReasoningPattern::BinaryThinking,
    ];

    fn set(patterns: &[ReasoningPattern]) -> PatternSet {
        patterns.iter().copied().collect()
    }

    fn types(prompts: &[RepathPrompt]) -> Vec<PromptType> {
        prompts.iter().map(|p| p.prompt_type).collect()
    }

    /// Every subset of the four patterns.
    fn all_subsets() -> Vec<PatternSet> {
        (0..16u8)
            .map(|mask| {
                ALL_PATTERNS
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, p)| *p)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_empty_patterns_yield_only_state_reset() {
        let prompts = generate(&PatternSet::new());
        assert_eq!(types(&prompts), vec![PromptType::StateReset]);
        assert_eq!(prompts[0].focus, PromptFocus::IntuitiveReset);
    }

    #[test]
    fn test_state_reset_generated_last_delivered_first() {
        let patterns = set(&[ReasoningPattern::UnevenReasoningChain]);
        let plan = plan_prompts(&patterns);
        assert_eq!(
            plan.candidates.last().map(|p| p.prompt_type),
            Some(PromptType::StateReset)
        );
        assert_eq!(plan.delivered[0].prompt_type, PromptType::StateReset);
    }

    #[test]
    fn test_exactly_one_state_reset_first_for_every_subset() {
        for patterns in all_subsets() {
            let prompts = generate(&patterns);
            let resets = prompts
                .iter()
                .filter(|p| p.prompt_type == PromptType::StateReset)
                .count();
            assert_eq!(resets, 1, "patterns: {}", patterns);
            assert_eq!(prompts[0].prompt_type, PromptType::StateReset);
        }
    }

    #[test]
    fn test_observation_and_anchor_never_delivered() {
        for patterns in all_subsets() {
            let prompts = generate(&patterns);
            assert!(prompts.len() <= 5);
            assert!(!types(&prompts).contains(&PromptType::EyesNeverLieCheck));
            assert!(!types(&prompts).contains(&PromptType::RealityAnchor));
        }
    }

    #[test]
    fn test_all_patterns_generate_seven_deliver_five() {
        let plan = plan_prompts(&set(&ALL_PATTERNS));
        assert_eq!(plan.candidates.len(), 7);
        assert_eq!(
            types(&plan.delivered),
            vec![
                PromptType::StateReset,
                PromptType::ContradictionResolution,
                PromptType::NarrativeExpansion,
                PromptType::ReasoningChain,
                PromptType::NuanceInjection,
            ]
        );
        assert_eq!(
            plan.dropped,
            vec![PromptType::EyesNeverLieCheck, PromptType::RealityAnchor]
        );
    }

    #[test]
    fn test_conditional_candidates() {
        let plan = plan_prompts(&set(&[ReasoningPattern::IncompleteNarrative]));
        assert_eq!(
            types(&plan.candidates),
            vec![
                PromptType::NarrativeExpansion,
                PromptType::EyesNeverLieCheck,
                PromptType::StateReset,
            ]
        );

        let plan = plan_prompts(&set(&[ReasoningPattern::HighContradictionCount]));
        assert_eq!(
            types(&plan.candidates),
            vec![
                PromptType::ContradictionResolution,
                PromptType::RealityAnchor,
                PromptType::StateReset,
            ]
        );

        let plan = plan_prompts(&set(&[ReasoningPattern::BinaryThinking]));
        assert_eq!(
            types(&plan.candidates),
            vec![
                PromptType::NuanceInjection,
                PromptType::EyesNeverLieCheck,
                PromptType::RealityAnchor,
                PromptType::StateReset,
            ]
        );
    }

    #[test]
    fn test_each_pattern_maps_to_dedicated_prompt() {
        assert_eq!(
            PromptType::for_pattern(ReasoningPattern::HighContradictionCount),
            PromptType::ContradictionResolution
        );
        assert_eq!(
            PromptType::for_pattern(ReasoningPattern::UnevenReasoningChain),
            PromptType::ReasoningChain
        );
        assert_eq!(
            PromptType::for_pattern(ReasoningPattern::IncompleteNarrative),
            PromptType::NarrativeExpansion
        );
        assert_eq!(
            PromptType::for_pattern(ReasoningPattern::BinaryThinking),
            PromptType::NuanceInjection
        );
    }

    #[test]
    fn test_prompt_serializes_type_field() {
        let json = serde_json::to_value(RepathPrompt::of(PromptType::ReasoningChain)).unwrap();
        assert_eq!(json["type"], "reasoning_chain");
        assert_eq!(json["focus"], "sequential_logic");
        assert!(json["text"].as_str().unwrap().contains("reasoning chain"));
    }

    #[test]
    fn test_protocol_reference_read() {
        let record = AnalysisRecord::default()
            .with_factor(Factor::SymbolicAlignment, 6.5)
            .with_factor(Factor::BeliefIntensity, 7.2)
            .with_factor(Factor::SentimentIntensity, 6.8)
            .with_factor(Factor::NarrativeBreathability, 5.9)
            .with_cascade([75.0, 45.0, 60.0, 30.0]);

        let outcome = RepathProtocol::execute(&record, &[]);
        assert!(outcome.repath_required);
        assert!((outcome.bsi_score.value() - 6.59).abs() < 1e-9);
        assert_eq!(
            types(&outcome.prompts),
            vec![
                PromptType::StateReset,
                PromptType::NarrativeExpansion,
                PromptType::ReasoningChain,
            ]
        );
        assert_eq!(outcome.recommendation.as_deref(), Some(REPATH_RECOMMENDATION));
        assert!(outcome.status.is_none());
    }

    #[test]
    fn test_protocol_acceptable_read() {
        let record = Factor::ALL
            .iter()
            .fold(AnalysisRecord::default(), |r, &f| r.with_factor(f, 8.0));
        let outcome = RepathProtocol::execute(&record, &[]);
        assert!(!outcome.repath_required);
        assert!(outcome.prompts.is_empty());
        assert!(outcome.patterns_detected.is_empty());
        assert_eq!(outcome.status.as_deref(), Some(ACCEPTABLE_STATUS));

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("recommendation").is_none());
    }
}
