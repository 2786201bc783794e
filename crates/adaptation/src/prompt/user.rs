//! User prompt for style adaptation.
//!
//! Sections are always emitted in the same order:
//!
//! 1. base recipe
//! 2. new request
//! 3. new image analysis
//! 4. brand kit override
//! 5. consistency checklist
//! 6. final instruction
//!
//! Sections without input are left out; the order of the rest never
//! changes.

use serde_json::{Map, Value};
use stylecraft_core::brand_kit::{BrandColors, BrandKitOverride};

use super::palette::{PaletteLayer, build_palette_prompt};

/// Everything the user prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct UserPromptInput<'a> {
    /// The recipe's visual concept, possibly a mitigated copy.
    pub original_visual_concept: &'a Map<String, Value>,
    pub new_request: Option<&'a str>,
    pub image_analysis: Option<&'a Value>,
    pub brand_kit: Option<&'a BrandKitOverride>,
    /// Set when the run state or the kit itself flags an override event.
    pub is_override_event: bool,
}

const CHECKLIST: &str = "\
## CONSISTENCY CHECKLIST
- Match the recipe's exact camera angle, framing and subject scale.
- Reuse the lighting direction, shadow placement and mood.
- Keep text style and placement identical; change only the wording.
- Keep branding placement and scale identical.
- Carry the color hierarchy over to the new subject without introducing off-palette colors.";

const FINAL_INSTRUCTION: &str = "\
## FINAL INSTRUCTION
Change only the subject-specific fields (`main_subject`, `background_environment`, `composition_and_framing`, and the wording of any rendered text) so they describe the new subject. Do not mention the original subject anywhere in your output.";

/// Build the user prompt from `input`.
pub fn build_user_prompt(input: &UserPromptInput<'_>) -> String {
    let mut sections = vec![format!(
        "## BASE STYLE RECIPE\n{}",
        to_pretty_json(&Value::Object(input.original_visual_concept.clone()))
    )];

    match (input.new_request, input.image_analysis) {
        (Some(request), _) => sections.push(format!("## NEW REQUEST\n{}", request.trim())),
        (None, Some(_)) => sections.push(
            "## NEW REQUEST\nNo text request was given. The image analysis below alone defines the new subject."
                .to_string(),
        ),
        (None, None) => {}
    }

    if let Some(analysis) = input.image_analysis {
        sections.push(format!("## NEW IMAGE ANALYSIS\n{}", to_pretty_json(analysis)));
    }

    if input.is_override_event {
        if let Some(section) = input.brand_kit.and_then(brand_override_section) {
            sections.push(section);
        }
    }

    sections.push(CHECKLIST.to_string());
    sections.push(FINAL_INSTRUCTION.to_string());
    sections.join("\n\n")
}

fn brand_override_section(kit: &BrandKitOverride) -> Option<String> {
    if kit.is_empty() {
        return None;
    }

    let mut parts = vec![
        "## BRAND KIT OVERRIDE\nThis brand kit replaces the one the recipe was made with. Its values take precedence over any branding in the base recipe."
            .to_string(),
    ];

    match &kit.colors {
        Some(BrandColors::Hex(hexes)) if !hexes.is_empty() => parts.push(format!(
            "Brand colors: {}. Rewrite `color_palette` so it harmonizes with these colors while keeping the recipe's color hierarchy.",
            hexes.join(", ")
        )),
        Some(BrandColors::Semantic(colors)) if !colors.is_empty() => {
            parts.push(build_palette_prompt(colors, PaletteLayer::StyleAdaptation));
        }
        _ => {}
    }

    if let Some(voice) = kit
        .brand_voice_description
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        parts.push(format!(
            "Brand voice: {voice}. Reflect it in the mood and in the wording of any rendered text."
        ));
    }

    match &kit.logo_analysis {
        Some(Value::String(text)) if !text.trim().is_empty() => parts.push(format!(
            "Logo: {}. Describe its placement in `logo_visuals`.",
            text.trim()
        )),
        Some(value @ (Value::Object(_) | Value::Array(_))) => parts.push(format!(
            "Logo analysis: {value}. Describe its placement in `logo_visuals`."
        )),
        _ => {}
    }

    Some(parts.join("\n"))
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stylecraft_core::brand_kit::BrandColor;

    fn recipe() -> Map<String, Value> {
        json!({
            "main_subject": "A gourmet burger",
            "lighting_and_mood": "Warm",
            "visual_style": "Food photography"
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn positions(prompt: &str, markers: &[&str]) -> Vec<usize> {
        markers
            .iter()
            .map(|m| prompt.find(m).unwrap_or_else(|| panic!("missing {m}")))
            .collect()
    }

    #[test]
    fn sections_in_fixed_order() {
        let recipe = recipe();
        let analysis = json!({"main_subject": "Coffee cup"});
        let kit = BrandKitOverride {
            colors: Some(BrandColors::Hex(vec!["#FF6B35".into()])),
            is_override_event: true,
            ..Default::default()
        };
        let prompt = build_user_prompt(&UserPromptInput {
            original_visual_concept: &recipe,
            new_request: Some("Latte art close-up"),
            image_analysis: Some(&analysis),
            brand_kit: Some(&kit),
            is_override_event: true,
        });
        let found = positions(
            &prompt,
            &[
                "## BASE STYLE RECIPE",
                "## NEW REQUEST",
                "## NEW IMAGE ANALYSIS",
                "## BRAND KIT OVERRIDE",
                "## CONSISTENCY CHECKLIST",
                "## FINAL INSTRUCTION",
            ],
        );
        assert!(found.windows(2).all(|w| w[0] < w[1]), "{found:?}");
        assert!(prompt.contains("Latte art close-up"));
        assert!(prompt.contains("#FF6B35"));
    }

    #[test]
    fn image_only_states_analysis_defines_subject() {
        let recipe = recipe();
        let analysis = json!({"main_subject": "Coffee cup"});
        let prompt = build_user_prompt(&UserPromptInput {
            original_visual_concept: &recipe,
            new_request: None,
            image_analysis: Some(&analysis),
            brand_kit: None,
            is_override_event: false,
        });
        assert!(prompt.contains("image analysis below alone defines the new subject"));
        assert!(prompt.contains("\"Coffee cup\""));
    }

    #[test]
    fn prompt_only_has_no_analysis_section() {
        let recipe = recipe();
        let prompt = build_user_prompt(&UserPromptInput {
            original_visual_concept: &recipe,
            new_request: Some("A slice of cake"),
            image_analysis: None,
            brand_kit: None,
            is_override_event: false,
        });
        assert!(!prompt.contains("## NEW IMAGE ANALYSIS"));
        assert!(prompt.contains("Do not mention the original subject"));
    }

    #[test]
    fn kit_without_override_event_is_ignored() {
        let recipe = recipe();
        let kit = BrandKitOverride {
            brand_voice_description: Some("Playful".into()),
            ..Default::default()
        };
        let input = UserPromptInput {
            original_visual_concept: &recipe,
            new_request: Some("Cake"),
            image_analysis: None,
            brand_kit: Some(&kit),
            is_override_event: false,
        };
        assert!(!build_user_prompt(&input).contains("BRAND KIT OVERRIDE"));

        let prompt = build_user_prompt(&UserPromptInput {
            is_override_event: true,
            ..input
        });
        assert!(prompt.contains("Brand voice: Playful."));
    }

    #[test]
    fn semantic_colors_and_logo() {
        let recipe = recipe();
        let kit = BrandKitOverride {
            colors: Some(BrandColors::Semantic(vec![
                BrandColor::new("#FF6B35").with_role("primary").with_ratio(0.8),
                BrandColor::new("#004E89").with_role("accent").with_ratio(0.2),
            ])),
            logo_analysis: Some(json!({"shape": "circle"})),
            ..Default::default()
        };
        let prompt = build_user_prompt(&UserPromptInput {
            original_visual_concept: &recipe,
            new_request: Some("Cake"),
            image_analysis: None,
            brand_kit: Some(&kit),
            is_override_event: true,
        });
        assert!(prompt.contains("#FF6B35 (primary), ~80% of color usage"));
        assert!(prompt.contains("Logo analysis: {\"shape\":\"circle\"}"));
    }

    #[test]
    fn even_split_override_has_no_percentages() {
        let recipe = recipe();
        let kit = BrandKitOverride {
            colors: Some(BrandColors::Semantic(vec![
                BrandColor::new("#FF6B35").with_role("primary").with_ratio(1.0 / 3.0),
                BrandColor::new("#004E89").with_role("secondary").with_ratio(1.0 / 3.0),
                BrandColor::new("#F7C59F").with_role("accent").with_ratio(1.0 / 3.0),
            ])),
            ..Default::default()
        };
        let prompt = build_user_prompt(&UserPromptInput {
            original_visual_concept: &recipe,
            new_request: Some("Cake"),
            image_analysis: None,
            brand_kit: Some(&kit),
            is_override_event: true,
        });
        assert!(prompt.contains("## BRAND KIT OVERRIDE"));
        assert!(prompt.contains("- #004E89 (secondary)"));
        assert!(!prompt.contains('%'));
    }
}
