//! Style recipe adaptation.
//!
//! Re-targets a saved style recipe to a new subject with one LLM call:
//!
//! 1. **Prompt compiler** ([`prompt`]) turns run-state inputs into a
//!    system and a user prompt
//! 2. **Token budget guard** ([`budget`]) estimates the prompt size and
//!    slims the recipe copy when it would not fit
//! 3. **JSON extractor** ([`extract`]) turns the reply, structured or raw
//!    text, into an object that satisfies the output schema
//! 4. **Orchestrator** ([`stage`]) ties these together and publishes the
//!    result into the run state

pub mod budget;
pub mod coercion;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod stage;
pub mod style_guard;

pub use budget::{BudgetCheck, apply_mitigation, check_token_budget, estimate_token_count};
pub use error::{AdaptationError, FailureKind};
pub use extract::{
    ExtractError, ParseMode, extract_and_parse, normalize_completion, should_use_manual_parsing,
};
pub use stage::{
    Preparation, PreparedAdaptation, SkipReason, StageOutcome, StyleAdaptationStage,
    run_style_adaptation,
};
pub use style_guard::{StyleDrift, check_style_preservation};

#[cfg(test)]
pub(crate) mod test_helpers;
