//! System prompt for style adaptation.

use super::language::{is_english, language_display_name};

const ROLE: &str = "You are an expert creative director. You adapt a saved STYLE RECIPE (the visual concept of an earlier image) to a NEW SUBJECT, so the new image looks like it belongs to the same campaign.";

const RULES: &str = "\
RULES:
1. PRESERVE STYLE: Keep `lighting_and_mood`, `color_palette` and `visual_style` from the base recipe. Copy them unless the new request explicitly asks for a change.
2. ADAPT THE SUBJECT: Rewrite `main_subject`, `background_environment` and `composition_and_framing` for the new subject. Keep the recipe's camera angle, framing and layout unless the new subject physically cannot fit them.
3. CONFLICTS: When the new request directly contradicts the base recipe, the new request wins.
4. NO CORRECTIVE EDITS: This is high-level creative adaptation only. Do not perform small corrective edits such as fixing typos, removing stray objects or retouching.
5. ALT TEXT: Write `suggested_alt_text` for the adapted image, not the original one.";

const OUTPUT_RULE: &str = "OUTPUT: Respond with a single JSON object that matches the visual concept schema. Do not wrap it in markdown code fences and do not add any text before or after the JSON.";

/// Build the system prompt.
///
/// The text and branding clauses switch wording with their flags, and a
/// non-English language adds a clause that keeps descriptive fields in
/// English while localizing rendered text.
pub fn build_system_prompt(render_text_enabled: bool, apply_branding_enabled: bool, language: &str) -> String {
    let sections = [
        ROLE.to_string(),
        RULES.to_string(),
        text_clause(render_text_enabled).to_string(),
        branding_clause(apply_branding_enabled).to_string(),
        language_clause(language),
        OUTPUT_RULE.to_string(),
    ];
    sections.join("\n\n")
}

fn text_clause(enabled: bool) -> &'static str {
    if enabled {
        "**Adapt Text:** `promotional_text_visuals` is REQUIRED. Keep the recipe's typography, text placement and treatment, and rewrite only the wording so it fits the new subject."
    } else {
        "**Omit Text:** Text rendering is disabled. Do NOT include the `promotional_text_visuals` field and do not describe any rendered words, captions or slogans in other fields."
    }
}

fn branding_clause(enabled: bool) -> &'static str {
    if enabled {
        "**Adapt Branding:** `logo_visuals` is REQUIRED. Place the logo as a non-destructive, watermark-style element at a corner or edge at modest scale; it must never cover or replace the main subject. If a brand kit override is provided, its colors, voice and logo take precedence over the branding in the base recipe."
    } else {
        "**Omit Branding:** Branding is disabled. Do NOT include the `logo_visuals` field and do not describe logos or brand marks."
    }
}

fn language_clause(language: &str) -> String {
    if is_english(language) {
        return "**Language:** Write every field in ENGLISH.".into();
    }
    let name = language_display_name(language);
    format!(
        "**Language:** The target language is {name}. Any literal text that is rendered in the image, and `suggested_alt_text`, must be in {name}. Every other field, including all descriptive and style fields, must stay in ENGLISH."
    )
}
