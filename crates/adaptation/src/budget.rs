//! Token estimation and prompt budget checks.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! Good enough to catch prompts that are clearly oversized before the
//! request leaves the process; it is not a tokenizer.

use serde_json::{Map, Value};
use stylecraft_core::visual_concept::fields;

/// Fraction of the context window a prompt may use.
pub const DEFAULT_UTILIZATION: f64 = 0.85;

/// Character cap for `texture_and_details` after mitigation.
pub const TEXTURE_AND_DETAILS_LIMIT: usize = 200;

/// Character cap for `negative_elements` after mitigation.
pub const NEGATIVE_ELEMENTS_LIMIT: usize = 100;

const ELLIPSIS: &str = "...";

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_token_count(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Outcome of one budget evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetCheck {
    pub estimated_tokens: usize,
    pub limit: usize,
    /// Largest estimate that still passes.
    pub threshold: usize,
}

impl BudgetCheck {
    pub fn within_budget(&self) -> bool {
        self.estimated_tokens <= self.threshold
    }
}

/// Evaluate a system/user prompt pair against `limit` at `utilization`.
pub fn evaluate_budget(system: &str, user: &str, limit: usize, utilization: f64) -> BudgetCheck {
    let utilization = utilization.clamp(0.0, 1.0);
    BudgetCheck {
        estimated_tokens: estimate_token_count(system) + estimate_token_count(user),
        limit,
        threshold: (limit as f64 * utilization).floor() as usize,
    }
}

/// True if the combined estimate fits within 85% of `limit`.
pub fn check_token_budget(system: &str, user: &str, limit: usize) -> bool {
    evaluate_budget(system, user, limit, DEFAULT_UTILIZATION).within_budget()
}

/// A slimmed copy of a visual concept for prompt building.
///
/// Drops `creative_reasoning` and caps `texture_and_details` and
/// `negative_elements`. The input map is left untouched; the trimmed
/// copy only ever feeds the prompt, never the stored recipe.
pub fn apply_mitigation(visual_concept: &Map<String, Value>) -> Map<String, Value> {
    let mut slim = visual_concept.clone();
    slim.remove(fields::CREATIVE_REASONING);
    cap_field(&mut slim, fields::TEXTURE_AND_DETAILS, TEXTURE_AND_DETAILS_LIMIT);
    cap_field(&mut slim, fields::NEGATIVE_ELEMENTS, NEGATIVE_ELEMENTS_LIMIT);
    slim
}

fn cap_field(map: &mut Map<String, Value>, field: &str, max_chars: usize) {
    if let Some(Value::String(text)) = map.get_mut(field) {
        if let Some(capped) = truncate_with_ellipsis(text, max_chars) {
            *text = capped;
        }
    }
}

/// `Some` with the first `max_chars` characters plus an ellipsis when
/// `text` is longer, `None` when it already fits.
fn truncate_with_ellipsis(text: &str, max_chars: usize) -> Option<String> {
    if text.chars().count() <= max_chars {
        return None;
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    Some(out)
}
