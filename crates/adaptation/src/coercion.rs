//! Flattening of nested objects that models return for text fields.
//!
//! Some models answer `main_subject`, `promotional_text_visuals` or
//! `logo_visuals` with an object instead of a sentence. These helpers
//! turn such objects back into the descriptive string the schema asks for.

use serde_json::{Map, Value};
use stylecraft_core::visual_concept::fields;

/// Coerce a nested value for one of the known misbehaving fields.
///
/// Returns `None` for any other field, or when nothing textual can be
/// recovered from the value.
pub fn coerce_nested_field(field: &str, value: &Value) -> Option<String> {
    let text = match (field, value) {
        (fields::MAIN_SUBJECT, Value::Object(obj)) => flatten_subject(obj),
        (fields::MAIN_SUBJECT, Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(flatten_subject(obj)),
                other => scalar(other),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        (fields::PROMOTIONAL_TEXT_VISUALS, Value::Object(obj)) => describe(obj, TEXT_LABELS),
        (fields::LOGO_VISUALS, Value::Object(obj)) => describe(obj, LOGO_LABELS),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Keys that name the subject itself and are emitted first.
const SUBJECT_LEAD_KEYS: &[&str] = &["description", "subject", "name"];

/// `{"description": "A burger", "garnish": "with bacon"}` becomes
/// `"A burger with bacon"`.
fn flatten_subject(obj: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for key in SUBJECT_LEAD_KEYS {
        if let Some(text) = obj.get(*key).and_then(text_of) {
            parts.push(text);
        }
    }
    for (key, value) in obj {
        if SUBJECT_LEAD_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(text) = text_of(value) {
            parts.push(text);
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

const TEXT_LABELS: &[(&str, &str)] = &[
    ("text_content", "Text"),
    ("text", "Text"),
    ("content", "Text"),
    ("font_style", "Font"),
    ("font", "Font"),
    ("typography", "Font"),
    ("color", "Color"),
    ("placement", "Placement"),
    ("position", "Placement"),
];

const LOGO_LABELS: &[(&str, &str)] = &[
    ("description", "Logo"),
    ("placement", "Placement"),
    ("position", "Placement"),
    ("size", "Size"),
    ("scale", "Size"),
    ("style", "Style"),
    ("treatment", "Style"),
    ("opacity", "Opacity"),
];

/// Render an object as `Label: value; Label: value.` using `labels` for
/// known keys and a humanized key for the rest. Text content is quoted.
fn describe(obj: &Map<String, Value>, labels: &[(&str, &str)]) -> String {
    let mut parts = Vec::new();
    for (key, value) in obj {
        let Some(text) = text_of(value).filter(|t| !t.is_empty()) else {
            continue;
        };
        let label = labels
            .iter()
            .find(|(k, _)| *k == key.as_str())
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| humanize(key));
        if label == "Text" {
            parts.push(format!("{label}: \"{text}\""));
        } else {
            parts.push(format!("{label}: {text}"));
        }
    }
    if parts.is_empty() {
        return String::new();
    }
    let mut sentence = parts.join("; ");
    if !sentence.ends_with('.') {
        sentence.push('.');
    }
    sentence
}

/// `font_weight` becomes `Font weight`.
fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => Some(flatten_subject(obj)),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(text_of)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
