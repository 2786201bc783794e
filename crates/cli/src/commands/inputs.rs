//! Run-state inputs shared by `adapt` and `prompts`.

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;
use stylecraft_core::brand_kit::BrandKitOverride;
use stylecraft_core::run_state::{PresetKind, RunState};
use stylecraft_core::visual_concept::StyleRecipe;

#[derive(Debug, Clone, Args)]
pub struct RunInputs {
    /// Style recipe JSON: `{visual_concept, strategy, style_guidance}` or a
    /// bare visual concept object
    #[arg(short, long)]
    pub recipe: PathBuf,

    /// New text request
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Image analysis JSON of the new subject image
    #[arg(long)]
    pub image_analysis: Option<PathBuf>,

    /// Brand kit JSON
    #[arg(long)]
    pub brand_kit: Option<PathBuf>,

    /// Treat the brand kit as an override of the recipe's branding
    #[arg(long = "override")]
    pub brand_override: bool,

    /// Output language code (defaults to `adaptation.default_language`)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Enable text rendering
    #[arg(long)]
    pub render_text: bool,

    /// Enable branding
    #[arg(long)]
    pub branding: bool,
}

impl RunInputs {
    /// Load the referenced files into a fresh run state.
    pub fn into_run_state(self, default_language: &str) -> Result<RunState, Box<dyn std::error::Error>> {
        let mut state = RunState::new();
        state.preset_kind = Some(PresetKind::StyleRecipe);
        state.preset_data = Some(load_recipe(&self.recipe)?);
        state.user_prompt = self.prompt;
        state.image_analysis = self.image_analysis.as_deref().map(read_json).transpose()?;
        state.brand_kit = match self.brand_kit.as_deref() {
            Some(path) => Some(serde_json::from_value::<BrandKitOverride>(read_json(path)?)?),
            None => None,
        };
        state.brand_kit_override_detected = self.brand_override;
        state.language = self.language.unwrap_or_else(|| default_language.to_string());
        state.render_text_enabled = self.render_text;
        state.apply_branding_enabled = self.branding;
        Ok(state)
    }
}

fn load_recipe(path: &Path) -> Result<StyleRecipe, Box<dyn std::error::Error>> {
    match read_json(path)? {
        Value::Object(map) if map.contains_key("visual_concept") => {
            Ok(serde_json::from_value(Value::Object(map))?)
        }
        Value::Object(map) => Ok(StyleRecipe {
            visual_concept: map,
            ..Default::default()
        }),
        _ => Err(format!("{} does not hold a JSON object", path.display()).into()),
    }
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    Ok(value)
}
