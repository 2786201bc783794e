//! Shared test helpers for adaptation tests.

use std::sync::Mutex;

use serde_json::{Value, json};
use stylecraft_core::error::ProviderError;
use stylecraft_core::provider::{Completion, Provider, ProviderRequest, ProviderResponse, Usage};
use stylecraft_core::run_state::{GeneratedImagePrompt, PresetKind, RunState};
use stylecraft_core::visual_concept::{StyleRecipe, VisualConceptDetails};

/// A mock provider that returns one scripted completion and records the
/// requests it receives.
pub struct ScriptedProvider {
    completion: Completion,
    usage: Option<Usage>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(completion: Completion) -> Self {
        Self {
            completion,
            usage: Some(Usage {
                prompt_tokens: 900,
                completion_tokens: 250,
                total_tokens: 1150,
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with an already-decoded JSON value.
    pub fn structured(value: Value) -> Self {
        Self::new(Completion::Structured(value))
    }

    /// Reply with raw text.
    pub fn raw_text(text: impl Into<String>) -> Self {
        Self::new(Completion::RawText(text.into()))
    }

    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            completion: self.completion.clone(),
            usage: self.usage,
            model: "mock-model".into(),
        })
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider(ProviderError);

impl FailingProvider {
    pub fn network(message: &str) -> Self {
        Self(ProviderError::Network(message.into()))
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.0.clone())
    }
}

/// A provider that panics inside `complete`.
pub struct PanickingProvider;

#[async_trait::async_trait]
impl Provider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("provider blew up");
    }
}

/// The burger recipe used throughout the tests.
pub fn burger_recipe() -> StyleRecipe {
    serde_json::from_value(json!({
        "visual_concept": {
            "main_subject": "A gourmet burger",
            "composition_and_framing": "Close-up, 45-degree angle",
            "background_environment": "Rustic wooden table",
            "lighting_and_mood": "Warm, appetizing lighting with soft shadows",
            "color_palette": "Warm browns and golden yellows",
            "visual_style": "Professional food photography",
            "suggested_alt_text": "A gourmet burger on a rustic table"
        },
        "strategy": {"target_audience": "Food lovers", "platform": "Instagram"},
        "style_guidance": {"style_keywords": ["warm", "rustic"]}
    }))
    .unwrap()
}

/// A run state that selects the burger recipe with a text prompt.
pub fn recipe_state() -> RunState {
    let mut state = RunState::new();
    state.preset_kind = Some(PresetKind::StyleRecipe);
    state.preset_data = Some(burger_recipe());
    state.user_prompt = Some("A ceramic coffee cup with latte art".into());
    state
}

/// A well-formed reply that keeps the recipe's style.
pub fn adapted_concept_json() -> Value {
    json!({
        "main_subject": "A ceramic coffee cup with latte art",
        "composition_and_framing": "Close-up, 45-degree angle",
        "background_environment": "Rustic wooden table",
        "lighting_and_mood": "Warm, appetizing lighting with soft shadows",
        "color_palette": "Warm browns and golden yellows",
        "visual_style": "Professional food photography",
        "suggested_alt_text": "A coffee cup with latte art on a rustic table"
    })
}

pub fn sample_prompt_entry() -> GeneratedImagePrompt {
    GeneratedImagePrompt {
        source_index: 3,
        visual_concept: VisualConceptDetails::from_map(
            adapted_concept_json().as_object().unwrap().clone(),
        )
        .unwrap(),
    }
}
