//! Read-quality analysis core.
//!
//! Everything in this module is synchronous and total: missing or malformed
//! input resolves to documented defaults, never to an error.
//!
//! ```text
//! AnalysisRecord ─┬─ calculate_bsi ──► BsiScore
//!                 ├─ detect_patterns ─► PatternSet ─► generate ─► [RepathPrompt]
//!                 └─ ValidationLoop ──► ValidationReport
//! ```

pub mod patterns;
pub mod record;
pub mod repath;
pub mod score;
pub mod validation;

pub use patterns::{detect_patterns, PatternSet, ReasoningPattern};
pub use record::{AnalysisRecord, CascadeLevel, ContradictionFlag, ContradictionPattern, Factor};
pub use repath::{
    generate, generate_candidates, plan_prompts, PromptFocus, PromptPlan, PromptType,
    RepathOutcome, RepathPrompt, RepathProtocol,
};
pub use score::{calculate_bsi, BsiScore, BSI_THRESHOLD};
pub use validation::{
    EvidenceSources, PrecedentData, ValidationInput, ValidationLoop, ValidationReport,
    ValidationStatus,
};
