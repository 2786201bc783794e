//! Post-adaptation check that the recipe's style fields survived.

use serde_json::{Map, Value};
use stylecraft_core::visual_concept::{VisualConceptDetails, fields};

/// Fields that carry the recipe's look and should come back unchanged.
pub const PRESERVED_STYLE_FIELDS: [&str; 3] =
    [fields::LIGHTING_AND_MOOD, fields::COLOR_PALETTE, fields::VISUAL_STYLE];

/// A style field the model rewrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDrift {
    pub field: &'static str,
    pub original: String,
    pub adapted: String,
}

/// Compare the preserved style fields of `original` against `adapted`.
///
/// Comparison ignores case and collapses whitespace. Fields missing from
/// the original recipe are not checked.
pub fn check_style_preservation(
    original: &Map<String, Value>,
    adapted: &VisualConceptDetails,
) -> Vec<StyleDrift> {
    PRESERVED_STYLE_FIELDS
        .iter()
        .filter_map(|&field| {
            let before = original.get(field).and_then(Value::as_str)?;
            let after = adapted.field(field).unwrap_or_default();
            (normalize(before) != normalize(after)).then(|| StyleDrift {
                field,
                original: before.to_string(),
                adapted: after.to_string(),
            })
        })
        .collect()
}

/// Write the original values of drifted fields back into `adapted`.
///
/// `color_palette` is left alone when `palette_overridden` is set: a brand
/// kit override is expected to change it. Returns the restored fields.
pub fn restore_style_fields(
    adapted: &mut VisualConceptDetails,
    drifts: &[StyleDrift],
    palette_overridden: bool,
) -> Vec<&'static str> {
    let mut restored = Vec::new();
    for drift in drifts {
        if palette_overridden && drift.field == fields::COLOR_PALETTE {
            continue;
        }
        if adapted.set_field(drift.field, drift.original.clone()) {
            restored.push(drift.field);
        }
    }
    restored
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
