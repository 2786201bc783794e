//! Brand kit override types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One brand color with its semantic role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandColor {
    pub hex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Share of color usage in `0.0..=1.0`. `None` means unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

impl BrandColor {
    pub fn new(hex: impl Into<String>) -> Self {
        Self {
            hex: hex.into(),
            role: None,
            label: None,
            ratio: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }
}

/// Brand colors in either of the two stored shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrandColors {
    /// A flat list of hex strings, e.g. `["#FF6B35", "#004E89"]`.
    Hex(Vec<String>),
    /// Semantic color records with role, label and usage ratio.
    Semantic(Vec<BrandColor>),
}

impl BrandColors {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Hex(list) => list.is_empty(),
            Self::Semantic(list) => list.is_empty(),
        }
    }
}

/// Brand kit applied on top of a style recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandKitOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BrandColors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_voice_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_analysis: Option<Value>,
    /// Set when this kit differs from the one that produced the recipe.
    #[serde(default)]
    pub is_override_event: bool,
}

impl BrandKitOverride {
    /// True when the kit carries nothing that could change a prompt.
    pub fn is_empty(&self) -> bool {
        self.colors.as_ref().is_none_or(BrandColors::is_empty)
            && self
                .brand_voice_description
                .as_deref()
                .is_none_or(|v| v.trim().is_empty())
            && self.logo_analysis.as_ref().is_none_or(Value::is_null)
    }
}
