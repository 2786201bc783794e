//! Visual concept and style recipe domain types.
//!
//! A [`StyleRecipe`] is the saved snapshot of an earlier generation; a
//! [`VisualConceptDetails`] is the structured description of one image
//! that the adaptation stage produces from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{ExpectedSchema, SchemaField};

/// Field names of the visual concept schema.
pub mod fields {
    pub const MAIN_SUBJECT: &str = "main_subject";
    pub const COMPOSITION_AND_FRAMING: &str = "composition_and_framing";
    pub const BACKGROUND_ENVIRONMENT: &str = "background_environment";
    pub const LIGHTING_AND_MOOD: &str = "lighting_and_mood";
    pub const COLOR_PALETTE: &str = "color_palette";
    pub const VISUAL_STYLE: &str = "visual_style";
    pub const PROMOTIONAL_TEXT_VISUALS: &str = "promotional_text_visuals";
    pub const LOGO_VISUALS: &str = "logo_visuals";
    pub const SUGGESTED_ALT_TEXT: &str = "suggested_alt_text";
    pub const CREATIVE_REASONING: &str = "creative_reasoning";
    pub const TEXTURE_AND_DETAILS: &str = "texture_and_details";
    pub const NEGATIVE_ELEMENTS: &str = "negative_elements";
}

/// Name under which the visual concept schema is sent to backends.
pub const VISUAL_CONCEPT_SCHEMA_NAME: &str = "visual_concept_details";

/// The structured description of one generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConceptDetails {
    pub main_subject: String,
    pub composition_and_framing: String,
    pub background_environment: String,
    pub lighting_and_mood: String,
    pub color_palette: String,
    pub visual_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotional_text_visuals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_visuals: Option<String>,
    pub suggested_alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_and_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_elements: Option<String>,
}

impl VisualConceptDetails {
    /// The expected output schema for the given feature flags.
    ///
    /// `promotional_text_visuals` is required only when text rendering is
    /// enabled, `logo_visuals` only when branding is enabled. When a flag
    /// is off the field is left out of the schema entirely.
    pub fn expected_schema(render_text_enabled: bool, apply_branding_enabled: bool) -> ExpectedSchema {
        let mut schema = vec![
            SchemaField::text(
                fields::MAIN_SUBJECT,
                true,
                "The primary subject of the image, described for the new request.",
            ),
            SchemaField::text(
                fields::COMPOSITION_AND_FRAMING,
                true,
                "Camera angle, framing and layout.",
            ),
            SchemaField::text(
                fields::BACKGROUND_ENVIRONMENT,
                true,
                "Setting and background behind the subject.",
            ),
            SchemaField::text(fields::LIGHTING_AND_MOOD, true, "Lighting and overall mood."),
            SchemaField::text(fields::COLOR_PALETTE, true, "Dominant colors and their hierarchy."),
            SchemaField::text(fields::VISUAL_STYLE, true, "Artistic or photographic style."),
        ];
        if render_text_enabled {
            schema.push(SchemaField::text(
                fields::PROMOTIONAL_TEXT_VISUALS,
                true,
                "Literal text to render and how it looks: font, color, placement.",
            ));
        }
        if apply_branding_enabled {
            schema.push(SchemaField::text(
                fields::LOGO_VISUALS,
                true,
                "Logo placement, scale and treatment.",
            ));
        }
        schema.extend([
            SchemaField::text(fields::SUGGESTED_ALT_TEXT, true, "Accessible alt text for the image."),
            SchemaField::text(fields::CREATIVE_REASONING, false, "Why the adaptation looks this way."),
            SchemaField::text(fields::TEXTURE_AND_DETAILS, false, "Surface textures and fine details."),
            SchemaField::text(fields::NEGATIVE_ELEMENTS, false, "Elements to keep out of the image."),
        ]);
        ExpectedSchema::new(VISUAL_CONCEPT_SCHEMA_NAME, schema)
    }

    /// Convert to a JSON object map, preserving field order.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Build from a normalized JSON object.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(map))
    }

    /// Read a string field by its schema name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::MAIN_SUBJECT => Some(&self.main_subject),
            fields::COMPOSITION_AND_FRAMING => Some(&self.composition_and_framing),
            fields::BACKGROUND_ENVIRONMENT => Some(&self.background_environment),
            fields::LIGHTING_AND_MOOD => Some(&self.lighting_and_mood),
            fields::COLOR_PALETTE => Some(&self.color_palette),
            fields::VISUAL_STYLE => Some(&self.visual_style),
            fields::PROMOTIONAL_TEXT_VISUALS => self.promotional_text_visuals.as_deref(),
            fields::LOGO_VISUALS => self.logo_visuals.as_deref(),
            fields::SUGGESTED_ALT_TEXT => Some(&self.suggested_alt_text),
            fields::CREATIVE_REASONING => self.creative_reasoning.as_deref(),
            fields::TEXTURE_AND_DETAILS => self.texture_and_details.as_deref(),
            fields::NEGATIVE_ELEMENTS => self.negative_elements.as_deref(),
            _ => None,
        }
    }

    /// Overwrite one of the required string fields. Returns false for
    /// unknown or optional fields.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            fields::MAIN_SUBJECT => &mut self.main_subject,
            fields::COMPOSITION_AND_FRAMING => &mut self.composition_and_framing,
            fields::BACKGROUND_ENVIRONMENT => &mut self.background_environment,
            fields::LIGHTING_AND_MOOD => &mut self.lighting_and_mood,
            fields::COLOR_PALETTE => &mut self.color_palette,
            fields::VISUAL_STYLE => &mut self.visual_style,
            fields::SUGGESTED_ALT_TEXT => &mut self.suggested_alt_text,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Immutable snapshot of a prior generation, reused as a style template.
///
/// The visual concept is kept as a loose map: recipes saved by older
/// pipeline versions may carry fields the current schema doesn't know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRecipe {
    #[serde(default)]
    pub visual_concept: Map<String, Value>,
    #[serde(default)]
    pub strategy: Map<String, Value>,
    #[serde(default)]
    pub style_guidance: Map<String, Value>,
}

impl StyleRecipe {
    /// True when the recipe carries no usable visual concept.
    pub fn is_empty(&self) -> bool {
        self.visual_concept.is_empty()
    }

    /// A string-valued field of the stored visual concept.
    pub fn concept_str(&self, name: &str) -> Option<&str> {
        self.visual_concept.get(name).and_then(Value::as_str)
    }
}
