//! Shared run state of one pipeline run.
//!
//! Stages read their inputs from [`RunState`] and hand back a
//! [`StageOutput`]; the executor merges it with [`RunState::apply`]. A
//! stage never pokes at run-state fields directly, so every value a stage
//! can publish is named here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::brand_kit::BrandKitOverride;
use crate::provider::Usage;
use crate::visual_concept::{StyleRecipe, VisualConceptDetails};

/// What kind of preset the user selected for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    /// A saved style recipe from an earlier generation.
    StyleRecipe,
    /// A brand or input template.
    Template,
}

/// What caused a style recipe to be adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// A new reference image defines the subject.
    NewSubjectImage,
    /// A new text prompt overrides the subject.
    PromptOverride,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSubjectImage => write!(f, "new_subject_image"),
            Self::PromptOverride => write!(f, "prompt_override"),
        }
    }
}

/// Provenance of one adaptation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationContext {
    pub original_visual_concept: serde_json::Map<String, Value>,
    pub adapted_visual_concept: VisualConceptDetails,
    pub adaptation_reasoning: String,
    pub trigger: TriggerKind,
    pub model: String,
    pub adapted_at: DateTime<Utc>,
}

/// One entry of the prompt list consumed by prompt assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImagePrompt {
    pub source_index: usize,
    pub visual_concept: VisualConceptDetails,
}

/// Mutable state of a single pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,

    // --- Inputs ---
    #[serde(default)]
    pub preset_kind: Option<PresetKind>,
    #[serde(default)]
    pub preset_data: Option<StyleRecipe>,
    #[serde(default)]
    pub render_text_enabled: bool,
    #[serde(default)]
    pub apply_branding_enabled: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub image_analysis: Option<Value>,
    #[serde(default)]
    pub brand_kit: Option<BrandKitOverride>,
    #[serde(default)]
    pub brand_kit_override_detected: bool,

    // --- Outputs ---
    #[serde(default)]
    pub visual_concept: Option<VisualConceptDetails>,
    #[serde(default)]
    pub suggested_marketing_strategies: Option<Vec<Value>>,
    #[serde(default)]
    pub style_guidance_sets: Option<Vec<Value>>,
    #[serde(default)]
    pub generated_image_prompts: Vec<GeneratedImagePrompt>,
    #[serde(default)]
    pub adaptation_context: Option<AdaptationContext>,
    #[serde(default)]
    pub original_subject: Option<String>,
    #[serde(default)]
    pub llm_usage: BTreeMap<String, Usage>,
    #[serde(default)]
    pub stage_error: Option<String>,
}

fn default_language() -> String {
    "en".into()
}

impl RunState {
    /// A fresh run state with a new run id and default inputs.
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            language: default_language(),
            ..Default::default()
        }
    }

    /// The user prompt, if it carries any non-whitespace text.
    pub fn effective_prompt(&self) -> Option<&str> {
        self.user_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// The image analysis, if present and not null.
    pub fn effective_image_analysis(&self) -> Option<&Value> {
        self.image_analysis.as_ref().filter(|v| !v.is_null())
    }

    /// Merge a stage's output. Only fields the stage set are written.
    pub fn apply(&mut self, output: StageOutput) {
        if let Some(concept) = output.visual_concept {
            self.visual_concept = Some(concept);
        }
        if let Some(strategies) = output.suggested_marketing_strategies {
            self.suggested_marketing_strategies = Some(strategies);
        }
        if let Some(guidance) = output.style_guidance_sets {
            self.style_guidance_sets = Some(guidance);
        }
        if let Some(prompts) = output.generated_image_prompts {
            self.generated_image_prompts = prompts;
        }
        if let Some(context) = output.adaptation_context {
            self.adaptation_context = Some(context);
        }
        if let Some(subject) = output.original_subject {
            self.original_subject = Some(subject);
        }
        if let Some((stage, usage)) = output.usage {
            self.llm_usage.insert(stage, usage);
        }
        if let Some(error) = output.stage_error {
            self.stage_error = Some(error);
        }
    }
}

/// Everything a stage may publish into the run state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    pub visual_concept: Option<VisualConceptDetails>,
    pub suggested_marketing_strategies: Option<Vec<Value>>,
    pub style_guidance_sets: Option<Vec<Value>>,
    /// `Some(vec![])` clears the prompt list.
    pub generated_image_prompts: Option<Vec<GeneratedImagePrompt>>,
    pub adaptation_context: Option<AdaptationContext>,
    pub original_subject: Option<String>,
    /// Token usage keyed by stage name.
    pub usage: Option<(String, Usage)>,
    pub stage_error: Option<String>,
}

impl StageOutput {
    /// The output of a failed stage: an error and an empty prompt list.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            generated_image_prompts: Some(Vec::new()),
            stage_error: Some(message.into()),
            ..Default::default()
        }
    }
}
