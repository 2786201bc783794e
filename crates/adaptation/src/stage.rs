//! The style adaptation stage.
//!
//! Runs when the user picked a saved style recipe and supplied either a
//! new image or a new prompt. The stage:
//!
//! 1. checks its preconditions and decides whether to run at all
//! 2. compiles the system and user prompts, slimming the recipe copy if
//!    the pair would not fit the context budget
//! 3. makes exactly one model call on a worker task
//! 4. normalizes the reply into a [`VisualConceptDetails`]
//! 5. publishes the adapted concept, the single-entry prompt list and the
//!    adaptation provenance into the run state
//!
//! It never returns an error to the caller. Failures land in the run
//! state's `stage_error` together with an empty prompt list, so later
//! stages have nothing stale to act on.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use stylecraft_config::{AdaptationConfig, AppConfig};
use stylecraft_core::message::Message;
use stylecraft_core::provider::{Completion, Provider, ProviderRequest, ResponseSchema, Usage};
use stylecraft_core::run_state::{
    AdaptationContext, GeneratedImagePrompt, PresetKind, RunState, StageOutput, TriggerKind,
};
use stylecraft_core::schema::ExpectedSchema;
use stylecraft_core::visual_concept::{StyleRecipe, VisualConceptDetails, fields};
use tracing::{debug, error, info, warn};

use crate::budget::{BudgetCheck, apply_mitigation, evaluate_budget};
use crate::coercion::coerce_nested_field;
use crate::error::{AdaptationError, FailureKind, RAW_PREVIEW_CHARS};
use crate::extract::{ParseMode, normalize_completion, select_parse_mode};
use crate::prompt::{UserPromptInput, build_system_prompt, build_user_prompt};
use crate::style_guard::{check_style_preservation, restore_style_fields};

/// Key under which the stage records its token usage.
pub const STAGE_NAME: &str = "style_adaptation";

/// Builds the output schema for the text and branding flags.
pub type SchemaFactory = fn(bool, bool) -> ExpectedSchema;

/// Why the stage chose not to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No preset, or a preset that is not a style recipe.
    NoPresetKind,
    /// A recipe was chosen but neither an image nor a prompt was given.
    NoTrigger,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPresetKind => write!(f, "preset is not a style recipe"),
            Self::NoTrigger => write!(f, "no new image or prompt to adapt to"),
        }
    }
}

/// Result of one stage run, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Skipped(SkipReason),
    Failed { kind: FailureKind, message: String },
    Succeeded,
}

/// Compiled prompts and settings for one adaptation call.
#[derive(Debug, Clone)]
pub struct PreparedAdaptation {
    pub system_prompt: String,
    pub user_prompt: String,
    pub parse_mode: ParseMode,
    pub schema: ExpectedSchema,
    pub trigger: TriggerKind,
    /// Budget of the prompts actually sent.
    pub budget: BudgetCheck,
    /// True when the recipe copy had to be slimmed to fit.
    pub mitigated: bool,
}

/// Whether a run state calls for an adaptation.
#[derive(Debug, Clone)]
pub enum Preparation {
    Skip(SkipReason),
    Ready(Box<PreparedAdaptation>),
}

/// The style adaptation stage.
pub struct StyleAdaptationStage {
    provider: Option<Arc<dyn Provider>>,
    model: String,
    settings: AdaptationConfig,
    schema: Option<SchemaFactory>,
}

impl StyleAdaptationStage {
    pub fn new(
        provider: Option<Arc<dyn Provider>>,
        model: impl Into<String>,
        settings: AdaptationConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            settings,
            schema: Some(VisualConceptDetails::expected_schema),
        }
    }

    /// Build from application config, using the adaptation model.
    pub fn from_config(config: &AppConfig, provider: Option<Arc<dyn Provider>>) -> Self {
        Self::new(provider, config.adaptation_model(), config.adaptation.clone())
    }

    /// Replace the output schema factory. `None` makes every run fail
    /// with a configuration error.
    pub fn with_schema(mut self, schema: Option<SchemaFactory>) -> Self {
        self.schema = schema;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn settings(&self) -> &AdaptationConfig {
        &self.settings
    }

    /// Run the stage against `state`. Never fails; see [`StageOutcome`].
    pub async fn run(&self, state: &mut RunState) -> StageOutcome {
        info!(run_id = %state.run_id, model = %self.model, "Style adaptation starting");

        match self.adapt(state).await {
            Ok(Some(reason)) => {
                info!(run_id = %state.run_id, %reason, "Style adaptation skipped");
                StageOutcome::Skipped(reason)
            }
            Ok(None) => StageOutcome::Succeeded,
            Err(err) => {
                let message = err.diagnostic();
                error!(run_id = %state.run_id, kind = %err.kind(), error = %err, "Style adaptation failed");
                state.apply(StageOutput::failure(message.clone()));
                StageOutcome::Failed {
                    kind: err.kind(),
                    message,
                }
            }
        }
    }

    /// Check preconditions and compile prompts without calling a model.
    ///
    /// Guards run in order: schema available, preset is a style recipe,
    /// an image or prompt is present, the recipe is not empty.
    pub fn prepare(&self, state: &RunState) -> Result<Preparation, AdaptationError> {
        let schema_factory = self.schema.ok_or_else(|| {
            AdaptationError::Configuration("visual concept output schema is not available".into())
        })?;

        if state.preset_kind != Some(PresetKind::StyleRecipe) {
            return Ok(Preparation::Skip(SkipReason::NoPresetKind));
        }

        let image_analysis = state.effective_image_analysis();
        let new_request = state.effective_prompt();
        if image_analysis.is_none() && new_request.is_none() {
            return Ok(Preparation::Skip(SkipReason::NoTrigger));
        }

        let recipe = non_empty_recipe(state)?;

        let trigger = if image_analysis.is_some() {
            TriggerKind::NewSubjectImage
        } else {
            TriggerKind::PromptOverride
        };
        let parse_mode = select_parse_mode(&self.model, &self.settings.manual_parsing_models);
        let schema = schema_factory(state.render_text_enabled, state.apply_branding_enabled);

        let language = if state.language.trim().is_empty() {
            self.settings.default_language.as_str()
        } else {
            state.language.as_str()
        };
        let system_prompt =
            build_system_prompt(state.render_text_enabled, state.apply_branding_enabled, language);

        let brand_kit = state.brand_kit.as_ref();
        let is_override_event =
            state.brand_kit_override_detected || brand_kit.is_some_and(|k| k.is_override_event);
        let user_prompt_for = |concept: &Map<String, Value>| {
            build_user_prompt(&UserPromptInput {
                original_visual_concept: concept,
                new_request,
                image_analysis,
                brand_kit,
                is_override_event,
            })
        };

        let mut user_prompt = user_prompt_for(&recipe.visual_concept);
        let mut budget = self.evaluate(&system_prompt, &user_prompt);
        let mut mitigated = false;

        if !budget.within_budget() {
            warn!(
                estimated = budget.estimated_tokens,
                threshold = budget.threshold,
                "Adaptation prompt over budget; slimming recipe copy"
            );
            let slim = apply_mitigation(&recipe.visual_concept);
            user_prompt = user_prompt_for(&slim);
            budget = self.evaluate(&system_prompt, &user_prompt);
            mitigated = true;

            if !budget.within_budget() {
                warn!(
                    estimated = budget.estimated_tokens,
                    threshold = budget.threshold,
                    "Adaptation prompt still over budget after mitigation; proceeding"
                );
            }
        }

        debug!(
            %trigger,
            parse_mode = %parse_mode,
            estimated_tokens = budget.estimated_tokens,
            mitigated,
            "Adaptation prompts compiled"
        );

        Ok(Preparation::Ready(Box::new(PreparedAdaptation {
            system_prompt,
            user_prompt,
            parse_mode,
            schema,
            trigger,
            budget,
            mitigated,
        })))
    }

    fn evaluate(&self, system: &str, user: &str) -> BudgetCheck {
        evaluate_budget(
            system,
            user,
            self.settings.context_window_tokens,
            self.settings.budget_utilization,
        )
    }

    /// Prepare, call the model, and apply the result to `state`.
    /// `Ok(Some(_))` means the stage skipped.
    async fn adapt(&self, state: &mut RunState) -> Result<Option<SkipReason>, AdaptationError> {
        let prepared = match self.prepare(state)? {
            Preparation::Ready(prepared) => prepared,
            Preparation::Skip(reason) => return Ok(Some(reason)),
        };

        let provider = self.provider.clone().ok_or_else(|| {
            AdaptationError::Configuration("no LLM client is configured for style adaptation".into())
        })?;

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(prepared.system_prompt.clone()),
                Message::user(prepared.user_prompt.clone()),
            ],
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_tokens),
            response_schema: match prepared.parse_mode {
                ParseMode::Structured => Some(ResponseSchema {
                    name: prepared.schema.name.clone(),
                    schema: prepared.schema.to_json_schema(),
                }),
                ParseMode::Manual => None,
            },
        };

        info!(
            provider = provider.name(),
            model = %self.model,
            parse_mode = %prepared.parse_mode,
            trigger = %prepared.trigger,
            "Dispatching style adaptation call"
        );

        // Worker task: a provider panic comes back as a JoinError.
        let response = tokio::spawn(async move { provider.complete(request).await })
            .await
            .map_err(|e| AdaptationError::Transport(format!("adaptation worker task failed: {e}")))?
            .map_err(|e| AdaptationError::Transport(e.to_string()))?;

        match response.usage {
            Some(usage) => info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Style adaptation token usage"
            ),
            None => debug!("Provider reported no token usage for style adaptation"),
        }

        if matches!(
            (&response.completion, prepared.parse_mode),
            (Completion::RawText(_), ParseMode::Structured)
        ) {
            debug!("Structured output requested but raw text returned; extracting manually");
        }
        debug!(
            raw = %response.completion.preview(RAW_PREVIEW_CHARS),
            "Style adaptation raw response"
        );

        let mut normalized =
            normalize_completion(&response.completion, &prepared.schema, &coerce_nested_field)
                .map_err(|e| AdaptationError::from_extract(e, self.settings.max_tokens))?;

        strip_forbidden_fields(
            &mut normalized,
            state.render_text_enabled,
            state.apply_branding_enabled,
        );

        let mut adapted = VisualConceptDetails::from_map(normalized).map_err(|e| {
            AdaptationError::Extraction {
                reason: format!("normalized object does not match visual concept: {e}"),
                raw: response.completion.preview(usize::MAX),
            }
        })?;

        let recipe = non_empty_recipe(state)?.clone();
        self.guard_style(&recipe, &mut adapted, state);

        let output = build_output(
            &recipe,
            adapted,
            prepared.trigger,
            &self.model,
            response.usage,
        );
        state.apply(output);

        info!(run_id = %state.run_id, trigger = %prepared.trigger, "Style adaptation succeeded");
        Ok(None)
    }

    fn guard_style(&self, recipe: &StyleRecipe, adapted: &mut VisualConceptDetails, state: &RunState) {
        let drifts = check_style_preservation(&recipe.visual_concept, adapted);
        if drifts.is_empty() {
            return;
        }
        for drift in &drifts {
            warn!(
                field = drift.field,
                original = %drift.original,
                adapted = %drift.adapted,
                "Adapted concept changed a preserved style field"
            );
        }
        if self.settings.enforce_style_preservation {
            let palette_overridden = state.brand_kit_override_detected
                || state.brand_kit.as_ref().is_some_and(|k| k.is_override_event);
            let restored = restore_style_fields(adapted, &drifts, palette_overridden);
            if !restored.is_empty() {
                info!(fields = ?restored, "Restored style fields from recipe");
            }
        }
    }
}

/// Run the style adaptation stage against `state`.
pub async fn run_style_adaptation(stage: &StyleAdaptationStage, state: &mut RunState) -> StageOutcome {
    stage.run(state).await
}

fn non_empty_recipe(state: &RunState) -> Result<&StyleRecipe, AdaptationError> {
    state
        .preset_data
        .as_ref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AdaptationError::Configuration("style recipe preset data is empty".into()))
}

/// Remove fields whose feature flag is off.
fn strip_forbidden_fields(map: &mut Map<String, Value>, render_text: bool, branding: bool) {
    if !render_text && map.remove(fields::PROMOTIONAL_TEXT_VISUALS).is_some() {
        warn!("Model returned promotional_text_visuals with text rendering disabled; dropped");
    }
    if !branding && map.remove(fields::LOGO_VISUALS).is_some() {
        warn!("Model returned logo_visuals with branding disabled; dropped");
    }
}

fn build_output(
    recipe: &StyleRecipe,
    adapted: VisualConceptDetails,
    trigger: TriggerKind,
    model: &str,
    usage: Option<Usage>,
) -> StageOutput {
    let reasoning = adapted
        .creative_reasoning
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| default_reasoning(trigger).to_string());

    StageOutput {
        visual_concept: Some(adapted.clone()),
        suggested_marketing_strategies: Some(vec![Value::Object(recipe.strategy.clone())]),
        style_guidance_sets: Some(vec![Value::Object(recipe.style_guidance.clone())]),
        generated_image_prompts: Some(vec![GeneratedImagePrompt {
            source_index: 0,
            visual_concept: adapted.clone(),
        }]),
        adaptation_context: Some(AdaptationContext {
            original_visual_concept: recipe.visual_concept.clone(),
            adapted_visual_concept: adapted,
            adaptation_reasoning: reasoning,
            trigger,
            model: model.to_string(),
            adapted_at: Utc::now(),
        }),
        original_subject: recipe.concept_str(fields::MAIN_SUBJECT).map(str::to_string),
        usage: usage.map(|u| (STAGE_NAME.to_string(), u)),
        stage_error: None,
    }
}

fn default_reasoning(trigger: TriggerKind) -> &'static str {
    match trigger {
        TriggerKind::NewSubjectImage => {
            "Adapted the saved style recipe to the subject of the new image, keeping its lighting, color palette and visual style."
        }
        TriggerKind::PromptOverride => {
            "Adapted the saved style recipe to the new prompt, keeping its lighting, color palette and visual style."
        }
    }
}
