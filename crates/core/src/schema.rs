//! Field-level description of a semi-structured LLM output.
//!
//! An [`ExpectedSchema`] is what the extractor validates a parsed object
//! against, and what gets rendered into a JSON Schema document for
//! backends that support structured decoding.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The JSON type a field must have after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A flat string. Nested objects arriving here are coerced.
    Text,
    /// A JSON object.
    Mapping,
}

/// One named field of the expected output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Short guidance rendered into the JSON Schema `description`.
    #[serde(default)]
    pub description: String,
}

impl SchemaField {
    pub fn text(name: impl Into<String>, required: bool, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            required,
            description: description.into(),
        }
    }

    pub fn mapping(name: impl Into<String>, required: bool, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Mapping,
            required,
            description: description.into(),
        }
    }
}

/// The full set of fields an output object may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSchema {
    /// Schema name, used as the structured-output schema name.
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl ExpectedSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of all required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Render as a JSON Schema object document.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let ty = match field.kind {
                FieldKind::Text => "string",
                FieldKind::Mapping => "object",
            };
            let mut prop = json!({ "type": ty });
            if !field.description.is_empty() {
                prop["description"] = Value::String(field.description.clone());
            }
            properties.insert(field.name.clone(), prop);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_fields().collect::<Vec<_>>(),
            "additionalProperties": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExpectedSchema {
        ExpectedSchema::new(
            "sample",
            vec![
                SchemaField::text("title", true, "The title"),
                SchemaField::text("note", false, ""),
                SchemaField::mapping("extra", false, ""),
            ],
        )
    }

    #[test]
    fn required_fields_in_order() {
        let schema = sample();
        assert_eq!(schema.required_fields().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(schema.field("extra").unwrap().kind, FieldKind::Mapping);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn json_schema_rendering() {
        let doc = sample().to_json_schema();
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["properties"]["title"]["type"], "string");
        assert_eq!(doc["properties"]["title"]["description"], "The title");
        assert!(doc["properties"]["note"].get("description").is_none());
        assert_eq!(doc["properties"]["extra"]["type"], "object");
        assert_eq!(doc["required"], json!(["title"]));
    }
}
