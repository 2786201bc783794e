//! Schema-aware JSON extraction.
//!
//! Turns an LLM reply into a normalized JSON object that satisfies an
//! [`ExpectedSchema`]. Two modes:
//!
//! - **Structured**: the backend already decoded the reply into a JSON
//!   value; only validation and normalization run.
//! - **Manual**: the reply is raw text. The first JSON object is located
//!   (code fences, leading prose and trailing chatter are tolerated),
//!   repaired where cheap, parsed and then validated.
//!
//! A reply that was cut off mid-object is reported as
//! [`ExtractError::Truncated`], never as a generic parse failure, so the
//! caller can point at the response-size ceiling.

use serde_json::error::Category;
use serde_json::{Map, Value};
use stylecraft_core::provider::Completion;
use stylecraft_core::schema::{ExpectedSchema, FieldKind};
use thiserror::Error;

/// How the reply of a model is turned into an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Ask the backend for schema-constrained output.
    Structured,
    /// Request plain text and extract the JSON object ourselves.
    Manual,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// True if `model_id` is on the list of models that need manual parsing.
///
/// Matching is exact after trimming and ignoring ASCII case; a model id
/// that merely contains a listed id as a substring does not match.
pub fn should_use_manual_parsing(model_id: &str, manual_models: &[String]) -> bool {
    let model_id = model_id.trim();
    manual_models
        .iter()
        .any(|m| m.trim().eq_ignore_ascii_case(model_id))
}

/// The parse mode to use for `model_id`.
pub fn select_parse_mode(model_id: &str, manual_models: &[String]) -> ParseMode {
    if should_use_manual_parsing(model_id, manual_models) {
        ParseMode::Manual
    } else {
        ParseMode::Structured
    }
}

/// Why a reply could not be turned into a conforming object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The reply ends before the JSON object is complete.
    #[error("response appears truncated: {reason}")]
    Truncated { reason: String, raw: String },

    /// No object found, malformed JSON, or schema violation.
    #[error("could not extract JSON object: {reason}")]
    Extraction { reason: String, raw: String },
}

impl ExtractError {
    fn truncated(reason: impl Into<String>, raw: &str) -> Self {
        Self::Truncated {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    fn extraction(reason: impl Into<String>, raw: &str) -> Self {
        Self::Extraction {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// The raw reply the error was raised for.
    pub fn raw(&self) -> &str {
        match self {
            Self::Truncated { raw, .. } | Self::Extraction { raw, .. } => raw,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Truncated { reason, .. } | Self::Extraction { reason, .. } => reason,
        }
    }

    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Collapses a nested value arriving in a text field into a string.
///
/// Called with the field name and the offending value. `None` means the
/// value cannot be coerced and extraction fails.
pub type Coercion<'a> = &'a dyn Fn(&str, &Value) -> Option<String>;

/// Normalize a provider completion, dispatching on its body.
pub fn normalize_completion(
    completion: &Completion,
    schema: &ExpectedSchema,
    coerce: Coercion<'_>,
) -> Result<Map<String, Value>, ExtractError> {
    match completion {
        Completion::Structured(value) => normalize_structured(value.clone(), schema, coerce),
        Completion::RawText(text) => extract_and_parse(text, schema, coerce),
    }
}

/// Validate an already-decoded value against `schema`.
pub fn normalize_structured(
    value: Value,
    schema: &ExpectedSchema,
    coerce: Coercion<'_>,
) -> Result<Map<String, Value>, ExtractError> {
    match value {
        Value::Object(map) => {
            let raw = Value::Object(map.clone()).to_string();
            validate(map, schema, coerce, &raw)
        }
        other => Err(ExtractError::extraction(
            format!("structured output is {}, not an object", type_name(&other)),
            &other.to_string(),
        )),
    }
}

/// Locate, parse and validate the first JSON object in free text.
pub fn extract_and_parse(
    text: &str,
    schema: &ExpectedSchema,
    coerce: Coercion<'_>,
) -> Result<Map<String, Value>, ExtractError> {
    let map = extract_object(text)?;
    validate(map, schema, coerce, text)
}

/// Locate and parse the first JSON object in free text, without any
/// schema validation.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::extraction("response is empty", text));
    }

    let body = strip_code_fence(text).filter(|b| b.contains('{')).unwrap_or(text);

    let mut first_failure: Option<ExtractError> = None;
    let mut cursor = 0;
    while let Some(offset) = body[cursor..].find('{') {
        let start = cursor + offset;
        match scan_object(&body[start..]) {
            Scan::Complete(len) => {
                let candidate = &body[start..start + len];
                match parse_candidate(candidate, text) {
                    Ok(map) => return Ok(map),
                    Err(err) => {
                        first_failure.get_or_insert(err);
                        cursor = start + len;
                    }
                }
            }
            Scan::Mismatched { reason, end } => {
                if opens_object(&body[start..]) {
                    first_failure.get_or_insert_with(|| ExtractError::extraction(reason, text));
                    cursor = start + end;
                } else {
                    cursor = start + 1;
                }
            }
            Scan::Incomplete(reason) => {
                // Everything after an unfinished object opening is inside it.
                if opens_object(&body[start..]) {
                    return Err(ExtractError::truncated(reason, text));
                }
                // A stray brace in prose; keep looking past it.
                cursor = start + 1;
            }
        }
    }

    Err(first_failure.unwrap_or_else(|| ExtractError::extraction("no JSON object found in response", text)))
}

/// Whether `input` starts like a JSON object: `{` followed by a key or `}`.
fn opens_object(input: &str) -> bool {
    matches!(input[1..].trim_start().chars().next(), Some('"' | '}') | None)
}

/// Content of the first fenced code block. An unterminated fence yields
/// everything after the opening line.
fn strip_code_fence(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_marker = &text[open + 3..];
    // Skip an info string such as `json` on the opening line.
    let content_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(after_marker.len());
    let content = &after_marker[content_start..];
    match content.find("```") {
        Some(close) => Some(&content[..close]),
        None => Some(content),
    }
}

enum Scan {
    /// Byte length of a balanced object starting at offset zero.
    Complete(usize),
    /// A closer that does not match the innermost open bracket, ending at `end`.
    Mismatched { reason: String, end: usize },
    /// Input ended inside the object.
    Incomplete(String),
}

/// Find where the object opening at the first byte of `input` ends.
///
/// Brackets inside string literals are ignored, escapes are honored.
fn scan_object(input: &str) -> Scan {
    let mut expected: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => expected.push('}'),
            '[' => expected.push(']'),
            '}' | ']' => {
                let end = idx + ch.len_utf8();
                match expected.pop() {
                    Some(closer) if closer == ch => {
                        if expected.is_empty() {
                            return Scan::Complete(end);
                        }
                    }
                    Some(closer) => {
                        return Scan::Mismatched {
                            reason: format!("malformed JSON: expected '{closer}' but found '{ch}' at byte {idx}"),
                            end,
                        };
                    }
                    None => {
                        return Scan::Mismatched {
                            reason: format!("malformed JSON: unmatched '{ch}' at byte {idx}"),
                            end,
                        };
                    }
                }
            }
            _ => {}
        }
    }

    if in_string {
        Scan::Incomplete("response ends inside a string value".into())
    } else {
        Scan::Incomplete(format!(
            "response ends with {} unclosed object or array level(s)",
            expected.len()
        ))
    }
}

/// Parse one balanced candidate, retrying once with trailing commas removed.
fn parse_candidate(candidate: &str, raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(first) => {
            let repaired = remove_trailing_commas(candidate);
            serde_json::from_str::<Value>(&repaired).map_err(|_| classify(&first, raw))?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExtractError::extraction(
            format!("top-level JSON value is {}, not an object", type_name(&other)),
            raw,
        )),
    }
}

fn classify(err: &serde_json::Error, raw: &str) -> ExtractError {
    match err.classify() {
        Category::Eof => ExtractError::truncated(format!("unexpected end of JSON: {err}"), raw),
        _ => ExtractError::extraction(format!("malformed JSON: {err}"), raw),
    }
}

/// Drop commas that directly precede `}` or `]`, outside string literals.
fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Check `map` against `schema` and normalize field types.
///
/// - Text fields holding an object or array of objects go through
///   `coerce`; arrays of scalars are joined; numbers and booleans are
///   stringified.
/// - Null optional fields are dropped.
/// - Fields unknown to the schema are passed through untouched.
fn validate(
    map: Map<String, Value>,
    schema: &ExpectedSchema,
    coerce: Coercion<'_>,
    raw: &str,
) -> Result<Map<String, Value>, ExtractError> {
    let mut out = Map::with_capacity(map.len());

    for (key, value) in map {
        let Some(field) = schema.field(&key) else {
            out.insert(key, value);
            continue;
        };
        if value.is_null() {
            continue;
        }
        let normalized = match field.kind {
            FieldKind::Text => normalize_text(&key, value, coerce).ok_or_else(|| {
                ExtractError::extraction(
                    format!("field `{key}` must be a string and could not be coerced"),
                    raw,
                )
            })?,
            FieldKind::Mapping => match value {
                Value::Object(_) => value,
                other => {
                    return Err(ExtractError::extraction(
                        format!("field `{key}` must be an object, got {}", type_name(&other)),
                        raw,
                    ));
                }
            },
        };
        out.insert(key, normalized);
    }

    let missing: Vec<&str> = schema
        .required_fields()
        .filter(|name| !out.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(ExtractError::extraction(
            format!("missing required field(s): {}", missing.join(", ")),
            raw,
        ));
    }

    Ok(out)
}

fn normalize_text(key: &str, value: Value, coerce: Coercion<'_>) -> Option<Value> {
    match value {
        Value::String(_) => Some(value),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        Value::Array(items) if items.iter().all(is_scalar) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            Some(Value::String(parts.join(", ")))
        }
        other => coerce(key, &other).map(Value::String),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stylecraft_core::schema::SchemaField;
    use stylecraft_core::visual_concept::VisualConceptDetails;

    fn schema() -> ExpectedSchema {
        ExpectedSchema::new(
            "sample",
            vec![
                SchemaField::text("main_subject", true, ""),
                SchemaField::text("visual_style", true, ""),
                SchemaField::text("creative_reasoning", false, ""),
                SchemaField::mapping("meta", false, ""),
            ],
        )
    }

    fn no_coercion(_: &str, _: &Value) -> Option<String> {
        None
    }

    fn join_values(_: &str, value: &Value) -> Option<String> {
        let obj = value.as_object()?;
        let parts: Vec<&str> = obj.values().filter_map(Value::as_str).collect();
        Some(parts.join(" "))
    }

    #[test]
    fn manual_parsing_matches_exact_ids_only() {
        let list = vec!["deepseek/deepseek-chat".to_string(), "qwen/qwen3-235b-a22b".into()];
        assert!(should_use_manual_parsing("deepseek/deepseek-chat", &list));
        assert!(should_use_manual_parsing("DeepSeek/DeepSeek-Chat", &list));
        assert!(!should_use_manual_parsing("deepseek/deepseek-chat-v2", &list));
        assert!(!should_use_manual_parsing("openai/gpt-4o", &list));
        assert_eq!(select_parse_mode("openai/gpt-4o", &list), ParseMode::Structured);
        assert_eq!(select_parse_mode("qwen/qwen3-235b-a22b", &list), ParseMode::Manual);
    }

    #[test]
    fn plain_object_parses() {
        let map = extract_and_parse(
            r#"{"main_subject": "A mug", "visual_style": "Photo"}"#,
            &schema(),
            &no_coercion,
        )
        .unwrap();
        assert_eq!(map["main_subject"], "A mug");
    }

    #[test]
    fn fenced_object_with_prose_parses() {
        let text = "Sure! Here is the concept:\n```json\n{\"main_subject\": \"A mug\", \"visual_style\": \"Photo\"}\n```\nLet me know if you need changes.";
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map["visual_style"], "Photo");
    }

    #[test]
    fn leading_prose_without_fence() {
        let text = "Adapted concept follows. {\"main_subject\": \"A mug {with braces}\", \"visual_style\": \"Photo\"} Done.";
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map["main_subject"], "A mug {with braces}");
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"{"main_subject": "A \"hero\" mug }", "visual_style": "Photo"}"#;
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map["main_subject"], "A \"hero\" mug }");
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let text = r#"{"main_subject": "A mug", "visual_style": "Photo",}"#;
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn cut_off_mid_string_is_truncation() {
        let text = r#"{"main_subject": "A mug", "visual_style": "Warm photogra"#;
        let err = extract_and_parse(text, &schema(), &no_coercion).unwrap_err();
        assert!(err.is_truncation(), "got {err:?}");
        assert_eq!(err.raw(), text);
    }

    #[test]
    fn cut_off_after_value_is_truncation() {
        let text = "```json\n{\"main_subject\": \"A mug\", \"visual_style\": \"Photo\",";
        let err = extract_and_parse(text, &schema(), &no_coercion).unwrap_err();
        assert!(err.is_truncation(), "got {err:?}");
    }

    #[test]
    fn no_object_is_extraction_error() {
        let err = extract_and_parse("I cannot help with that.", &schema(), &no_coercion).unwrap_err();
        assert!(!err.is_truncation());
        assert!(err.reason().contains("no JSON object"));

        let err = extract_and_parse("   ", &schema(), &no_coercion).unwrap_err();
        assert!(matches!(err, ExtractError::Extraction { .. }));
    }

    #[test]
    fn malformed_object_is_extraction_error() {
        let err = extract_and_parse(r#"{"main_subject": A mug}"#, &schema(), &no_coercion).unwrap_err();
        assert!(matches!(err, ExtractError::Extraction { .. }));
        assert!(err.reason().contains("malformed"));
    }

    #[test]
    fn mismatched_closer_is_extraction_error() {
        let text = r#"{"main_subject": "x", "visual_style": ["a", "b"}"#;
        let err = extract_and_parse(text, &schema(), &no_coercion).unwrap_err();
        assert!(!err.is_truncation(), "got {err:?}");
        assert!(err.reason().contains("expected ']' but found '}'"));

        let err = extract_object(r#"{"main_subject": "x"]}"#).unwrap_err();
        assert!(matches!(err, ExtractError::Extraction { .. }));
    }

    #[test]
    fn stray_brace_in_prose_does_not_hide_object() {
        let text = r#"Sure :-{ here it is: {"main_subject": "A mug", "visual_style": "Photo"}"#;
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map["main_subject"], "A mug");
    }

    #[test]
    fn stray_brace_without_object_is_not_truncation() {
        let err = extract_object("I could not finish :-{ sorry").unwrap_err();
        assert!(!err.is_truncation(), "got {err:?}");
        assert!(err.reason().contains("no JSON object"));
    }

    #[test]
    fn stray_brace_before_mismatched_closer_keeps_inner_object() {
        let text = r#"Hmm {so: {"main_subject": "A mug", "visual_style": "Photo"} ] done"#;
        let map = extract_and_parse(text, &schema(), &no_coercion).unwrap();
        assert_eq!(map["visual_style"], "Photo");
    }

    #[test]
    fn truncated_object_ignores_nested_fragments() {
        let text = r#"{"main_subject": {"description": "A mug"}, "visual_style": "Pho"#;
        let err = extract_and_parse(text, &schema(), &join_values).unwrap_err();
        assert!(err.is_truncation(), "got {err:?}");
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = extract_and_parse(r#"{"main_subject": "A mug"}"#, &schema(), &no_coercion).unwrap_err();
        assert!(err.reason().contains("visual_style"));
    }

    #[test]
    fn nested_text_field_goes_through_coercion() {
        let text = r#"{"main_subject": {"description": "A burger", "garnish": "with bacon"}, "visual_style": "Photo"}"#;
        let map = extract_and_parse(text, &schema(), &join_values).unwrap();
        assert_eq!(map["main_subject"], "A burger with bacon");

        let err = extract_and_parse(text, &schema(), &no_coercion).unwrap_err();
        assert!(err.reason().contains("main_subject"));
    }

    #[test]
    fn scalars_and_nulls_are_normalized() {
        let value = json!({
            "main_subject": ["mug", "saucer"],
            "visual_style": 35,
            "creative_reasoning": null,
            "extra": {"kept": true}
        });
        let map = normalize_structured(value, &schema(), &no_coercion).unwrap();
        assert_eq!(map["main_subject"], "mug, saucer");
        assert_eq!(map["visual_style"], "35");
        assert!(!map.contains_key("creative_reasoning"));
        assert_eq!(map["extra"], json!({"kept": true}));
    }

    #[test]
    fn mapping_field_must_be_object() {
        let value = json!({"main_subject": "a", "visual_style": "b", "meta": "flat"});
        let err = normalize_structured(value, &schema(), &no_coercion).unwrap_err();
        assert!(err.reason().contains("meta"));
    }

    #[test]
    fn structured_non_object_is_rejected() {
        let err = normalize_structured(json!(["a"]), &schema(), &no_coercion).unwrap_err();
        assert!(err.reason().contains("not an object"));
    }

    #[test]
    fn completion_dispatch() {
        let structured = Completion::Structured(json!({"main_subject": "a", "visual_style": "b"}));
        let raw = Completion::RawText(r#"{"main_subject": "a", "visual_style": "b"}"#.into());
        assert_eq!(
            normalize_completion(&structured, &schema(), &no_coercion).unwrap(),
            normalize_completion(&raw, &schema(), &no_coercion).unwrap()
        );
    }

    #[test]
    fn well_formed_concept_survives_extraction_unchanged() {
        let concept = VisualConceptDetails {
            main_subject: "A gourmet burger with melted cheddar".into(),
            composition_and_framing: "Close-up, 45-degree angle".into(),
            background_environment: "Rustic wooden table".into(),
            lighting_and_mood: "Warm, appetizing lighting".into(),
            color_palette: "Warm browns and golden yellows".into(),
            visual_style: "Professional food photography".into(),
            promotional_text_visuals: Some("Text: \"Grill Night\"; Font: bold serif.".into()),
            logo_visuals: Some("Small logo, bottom right".into()),
            suggested_alt_text: "A burger on a wooden table".into(),
            creative_reasoning: None,
            texture_and_details: Some("Glossy bun, charred edges".into()),
            negative_elements: None,
        };
        let text = serde_json::to_string_pretty(&concept).unwrap();
        let schema = VisualConceptDetails::expected_schema(true, true);

        let map = extract_and_parse(&text, &schema, &no_coercion).unwrap();
        assert_eq!(map, concept.to_map());
        assert_eq!(VisualConceptDetails::from_map(map).unwrap(), concept);
    }
}
