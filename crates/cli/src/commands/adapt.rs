//! `stylecraft adapt`: Run the style adaptation stage.

use std::path::PathBuf;

use serde_json::json;
use stylecraft_adaptation::{StageOutcome, StyleAdaptationStage, run_style_adaptation};
use stylecraft_config::AppConfig;

use super::inputs::RunInputs;

pub async fn run(
    inputs: RunInputs,
    model: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early: give a clear error
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
        eprintln!("    OPENAI_API_KEY=sk-...             (for OpenAI direct)");
        eprintln!("    STYLECRAFT_API_KEY=sk-...         (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let mut state = inputs.into_run_state(&config.adaptation.default_language)?;

    let router = stylecraft_providers::router::build_from_config(&config);
    let provider = router.default();
    let stage = match model {
        Some(model) => StyleAdaptationStage::new(provider, model, config.adaptation.clone()),
        None => StyleAdaptationStage::from_config(&config, provider),
    };

    let outcome = run_style_adaptation(&stage, &mut state).await;

    let outcome_json = match &outcome {
        StageOutcome::Succeeded => json!({"status": "succeeded"}),
        StageOutcome::Skipped(reason) => json!({"status": "skipped", "reason": reason.to_string()}),
        StageOutcome::Failed { kind, message } => {
            json!({"status": "failed", "kind": kind.to_string(), "message": message})
        }
    };
    let report = json!({
        "run_id": state.run_id,
        "outcome": outcome_json,
        "visual_concept": state.visual_concept,
        "generated_image_prompts": state.generated_image_prompts,
        "suggested_marketing_strategies": state.suggested_marketing_strategies,
        "style_guidance_sets": state.style_guidance_sets,
        "original_subject": state.original_subject,
        "adaptation_context": state.adaptation_context,
        "llm_usage": state.llm_usage,
        "stage_error": state.stage_error,
    });
    let rendered = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            eprintln!("Wrote result to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    match outcome {
        StageOutcome::Failed { message, .. } => Err(message.into()),
        StageOutcome::Skipped(reason) => {
            eprintln!("Adaptation skipped: {reason}");
            Ok(())
        }
        StageOutcome::Succeeded => Ok(()),
    }
}
