//! Centralized prompt definitions.
//!
//! Holds the system prompts for the two Langbase collaborator pipes and the
//! fixed texts of the re-path prompts handed back to the author of a read.
//! Centralizing prompts makes them easier to maintain, test, and version.

/// System prompt for the contradiction detection pipe.
///
/// The four pattern names must stay in sync with
/// [`ContradictionPattern`](crate::analysis::ContradictionPattern) parsing.
pub const CONTRADICTION_DETECTION_PROMPT: &str = r#"You are "Contra", an analyst that inspects subjective reads (narrative predictions about an uncertain outcome such as a match or a market move). Your only job is to expose internal contradictions, cognitive biases and un-weighted power factors in the read. Do not give predictions or advice.

For every issue you find, report:
- statement: a short quote or paraphrase of the conflicting statements
- pattern: exactly one of
  - "Expectation vs. Condition Mismatch": the expected outcome conflicts with the conditions described
  - "Paradox Identification Without Exploration": a paradox is named but its implications are dismissed
  - "Power Factor Without Weight Assignment": a significant factor is noted but never weighted in the conclusion
  - "Fundamental Trait vs. Arbitrary Limitation": a core strength is framed as a weakness without reasoning
- flag: one direct, pointed question that forces the author to confront the inconsistency

Your response MUST be valid JSON in this exact format:
{
  "contradictions": [
    {"statement": "...", "pattern": "...", "flag": "...?"}
  ]
}

Return an empty list when the read is internally consistent. Always respond with valid JSON only, no other text."#;

/// System prompt for the historical precedent lookup pipe.
pub const PRECEDENT_LOOKUP_PROMPT: &str = r#"You are a historical pattern analyst. Given a subjective read, find comparable historical situations and how reliable similar reads turned out to be.

Your response MUST be valid JSON in this format:
{
  "historical_precedents": [
    {"matchup": "short label of the comparable situation", "historical_accuracy": 0.65}
  ],
  "pattern_matches": ["narrative patterns the read shares with history"],
  "precedent_accuracy": 0.72,
  "outlier_factors": ["factors that make this case unlike its precedents"]
}

Guidelines:
- historical_accuracy and precedent_accuracy are fractions between 0.0 and 1.0
- omit precedent_accuracy when no comparable history exists
- Always respond with valid JSON only, no other text."#;

// ============================================================================
// Re-path prompt texts
// ============================================================================

/// Forces the author to pick the dominant side of a contradiction.
pub const CONTRADICTION_RESOLUTION_TEXT: &str = "I notice contradictory statements in your read. Let's clarify: you credited one side with a quality, but also said the other side can match it. Which is the dominant factor? Take 30 seconds to think through this one point only.";

/// Walks the reasoning chain one step at a time.
pub const REASONING_CHAIN_TEXT: &str = "Your initial insight is strong, but the reasoning chain breaks down. Let's trace one path: IF your initial insight is correct, what would you expect to see happen first? Just focus on the immediate next step.";

/// Asks for stakes and the single interesting element of the story.
pub const NARRATIVE_EXPANSION_TEXT: &str = "The story feels incomplete. Imagine you're explaining this matchup to someone who has never seen either side. What's the ONE thing that makes this interesting? What's at stake beyond just winning?";

/// Replaces extreme ratings with a shared scale.
pub const NUANCE_INJECTION_TEXT: &str = "You're thinking in extremes (all power vs. no power). Let's add nuance: on a scale of 1-10, rate both sides on the SAME dimension. Where do they actually differ by 2-3 points rather than 8-10 points?";

/// Direct-observation check.
pub const EYES_NEVER_LIE_TEXT: &str = "Stop analyzing and just observe: if you could see both sides right now, what would their eyes tell you? What does their body language actually show? The eyes never lie - what do you SEE, not think?";

/// Evidence grounding check.
pub const REALITY_ANCHOR_TEXT: &str = "You're building a theoretical framework. Step back: what actual evidence from recent matches, interviews, or head-to-head history supports this? What specific examples can you point to?";

/// Intuitive reset, always issued.
pub const STATE_RESET_TEXT: &str = "Take 60 seconds. Close your eyes. What's your gut feeling about this when you're not trying to analyze it? What's the first image or word that comes to mind?";
