//! `stylecraft prompts`: Show the compiled prompts without calling a model.

use stylecraft_adaptation::{Preparation, StyleAdaptationStage};
use stylecraft_config::AppConfig;

use super::inputs::RunInputs;

pub async fn run(inputs: RunInputs, model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let state = inputs.into_run_state(&config.adaptation.default_language)?;

    let model = model.unwrap_or_else(|| config.adaptation_model().to_string());
    let stage = StyleAdaptationStage::new(None, model, config.adaptation.clone());

    let prepared = match stage.prepare(&state).map_err(|e| e.diagnostic())? {
        Preparation::Skip(reason) => {
            println!("Adaptation would be skipped: {reason}");
            return Ok(());
        }
        Preparation::Ready(prepared) => prepared,
    };

    println!("=== SYSTEM PROMPT ===\n{}\n", prepared.system_prompt);
    println!("=== USER PROMPT ===\n{}\n", prepared.user_prompt);
    println!("=== SUMMARY ===");
    println!("  Model:        {}", stage.model());
    println!("  Parse mode:   {}", prepared.parse_mode);
    println!("  Trigger:      {}", prepared.trigger);
    println!("  Schema:       {} ({} fields)", prepared.schema.name, prepared.schema.fields.len());
    println!(
        "  Tokens:       ~{} of {} allowed ({} context window)",
        prepared.budget.estimated_tokens, prepared.budget.threshold, prepared.budget.limit
    );
    if prepared.mitigated {
        println!("  Mitigation:   recipe copy slimmed to fit the budget");
    }
    if !prepared.budget.within_budget() {
        println!("  ⚠️  Prompts exceed the budget; the call would proceed anyway");
    }

    Ok(())
}
