//! Brand color palette formatting.
//!
//! The builder takes the layer the palette is written into; each layer
//! carries its own header and closing instruction.

use stylecraft_core::brand_kit::BrandColor;

/// Tolerance below which a ratio counts as the even split.
const EVEN_SPLIT_TOLERANCE: f64 = 0.01;

/// Which prompt a palette is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteLayer {
    /// The style adaptation user prompt.
    StyleAdaptation,
}

impl PaletteLayer {
    fn header(self) -> &'static str {
        match self {
            Self::StyleAdaptation => "Brand color palette (harmonize `color_palette` with these colors):",
        }
    }

    fn footer(self) -> &'static str {
        match self {
            Self::StyleAdaptation => {
                "Map the recipe's dominant, secondary and accent colors onto these brand colors by role, keeping its color hierarchy."
            }
        }
    }
}

/// Render semantic brand colors as a prompt block.
///
/// A usage percentage is printed only for colors whose ratio departs
/// from an even split across all colors. Empty input renders nothing.
pub fn build_palette_prompt(colors: &[BrandColor], layer: PaletteLayer) -> String {
    if colors.is_empty() {
        return String::new();
    }

    let mut lines = vec![layer.header().to_string()];
    for color in colors {
        let mut line = match color.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => format!("- {label} {}", color.hex),
            None => format!("- {}", color.hex),
        };
        if let Some(role) = color.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            line.push_str(&format!(" ({role})"));
        }
        if let Some(ratio) = custom_ratio(color.ratio, colors.len()) {
            line.push_str(&format!(", ~{}% of color usage", (ratio * 100.0).round() as u32));
        }
        lines.push(line);
    }
    lines.push(layer.footer().to_string());
    lines.join("\n")
}

/// The ratio as a fraction, when it is set and differs from `1 / count`.
///
/// Ratios above 1 are read as percentages.
pub fn custom_ratio(ratio: Option<f64>, count: usize) -> Option<f64> {
    let ratio = ratio.filter(|r| r.is_finite() && *r > 0.0)?;
    let ratio = if ratio > 1.0 { ratio / 100.0 } else { ratio };
    if count == 0 {
        return Some(ratio);
    }
    let even = 1.0 / count as f64;
    ((ratio - even).abs() > EVEN_SPLIT_TOLERANCE).then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_has_no_percentages() {
        let colors = vec![
            BrandColor::new("#FF6B35").with_role("primary").with_ratio(0.5),
            BrandColor::new("#004E89").with_role("secondary").with_ratio(0.5),
        ];
        let text = build_palette_prompt(&colors, PaletteLayer::StyleAdaptation);
        assert!(text.contains("- #FF6B35 (primary)"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn custom_ratio_is_printed() {
        let colors = vec![
            BrandColor::new("#FF6B35").with_label("Sunset Orange").with_role("primary").with_ratio(0.7),
            BrandColor::new("#004E89").with_role("accent").with_ratio(0.3),
        ];
        let text = build_palette_prompt(&colors, PaletteLayer::StyleAdaptation);
        assert!(text.starts_with("Brand color palette"));
        assert!(text.contains("- Sunset Orange #FF6B35 (primary), ~70% of color usage"));
        assert!(text.contains("- #004E89 (accent), ~30% of color usage"));
    }

    #[test]
    fn only_customized_colors_carry_a_percentage() {
        let colors = vec![
            BrandColor::new("#FF6B35").with_role("primary").with_ratio(0.6),
            BrandColor::new("#004E89").with_role("secondary"),
            BrandColor::new("#F7C59F").with_role("accent").with_ratio(1.0 / 3.0),
        ];
        let text = build_palette_prompt(&colors, PaletteLayer::StyleAdaptation);
        assert!(text.contains("- #FF6B35 (primary), ~60% of color usage"));
        assert!(text.contains("- #004E89 (secondary)\n"));
        assert_eq!(text.matches('%').count(), 1);
    }

    #[test]
    fn ratio_edge_cases() {
        assert_eq!(custom_ratio(None, 2), None);
        assert_eq!(custom_ratio(Some(0.505), 2), None);
        assert_eq!(custom_ratio(Some(60.0), 2), Some(0.6));
        assert_eq!(custom_ratio(Some(0.0), 2), None);
    }

    #[test]
    fn adaptation_layer_keeps_hierarchy_and_empty_renders_nothing() {
        let colors = vec![BrandColor::new("#111111")];
        let text = build_palette_prompt(&colors, PaletteLayer::StyleAdaptation);
        assert!(text.contains("- #111111"));
        assert!(text.ends_with("keeping its color hierarchy."));
        assert!(build_palette_prompt(&[], PaletteLayer::StyleAdaptation).is_empty());
    }
}
