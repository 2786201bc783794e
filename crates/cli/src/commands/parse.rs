//! `stylecraft parse`: Run the JSON extractor on a saved model response.

use std::path::Path;

use stylecraft_adaptation::coercion::coerce_nested_field;
use stylecraft_adaptation::{ExtractError, extract_and_parse};
use stylecraft_core::visual_concept::VisualConceptDetails;

pub async fn run(file: &Path, render_text: bool, branding: bool) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let schema = VisualConceptDetails::expected_schema(render_text, branding);

    match extract_and_parse(&raw, &schema, &coerce_nested_field) {
        Ok(map) => {
            println!("{}", serde_json::to_string_pretty(&map)?);
            Ok(())
        }
        Err(ExtractError::Truncated { reason, .. }) => {
            Err(format!("Response is truncated: {reason}").into())
        }
        Err(ExtractError::Extraction { reason, .. }) => {
            Err(format!("Extraction failed: {reason}").into())
        }
    }
}
