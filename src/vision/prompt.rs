use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::domain::{LocationContext, Orientation, ShadingLevel};

/// Panel footprint the oracle is told to assume when counting panels.
const PROMPT_PANEL_AREA_SQM: f64 = 1.7;

/// Builds the single instruction sent with the rooftop image.
pub fn rooftop_prompt(ctx: &LocationContext) -> String {
    let orientations = Orientation::iter().map(|o| format!("'{o}'")).join(", ");
    let shading_levels = ShadingLevel::iter()
        .filter(|s| *s != ShadingLevel::Unknown)
        .map(|s| format!("'{s}'"))
        .join(", ");

    format!(
        r#"You are an expert AI assistant specializing in solar energy rooftop analysis.
Analyze the provided satellite image of a rooftop located at:
Address: {address}
Latitude: {latitude}
Longitude: {longitude}

Carefully identify the following features and provide your analysis in a JSON format ONLY.
Do not include any text before or after the JSON. Ensure the JSON is valid and well-formed.

JSON Structure:
{{
  "rooftop_shape": "string (e.g., 'rectangular', 'L-shaped', 'complex', 'irregular')",
  "approx_usable_area_sqm": "float (estimate, considering obstructions, round to 1 decimal place)",
  "dominant_orientation": "string (one of {orientations})",
  "shading_level": "string (one of {shading_levels})",
  "shading_sources": "array of strings (e.g., ['tall trees to the west', 'adjacent building to the north', 'chimney'])",
  "visible_obstructions": "array of strings (e.g., ['vents', 'skylights', 'HVAC units', 'antennas'])",
  "panel_layout_suggestion": "string (e.g., 'single array on south face', 'split arrays due to obstructions')",
  "preliminary_feasibility_notes": "string (e.g., 'appears highly suitable', 'potential shading concerns')",
  "estimated_max_panel_count": "integer (estimate based on usable area and typical panel size of ~{panel_area} sqm)",
  "is_suitable_for_solar": "boolean (true if generally suitable, false if significant challenges)",
  "confidence_score_percent": "integer (your confidence in this analysis, 0-100)"
}}

Focus on providing precise estimates and observations based only on the image.
If a value cannot be reasonably determined from the image, use 'Unknown' or an empty array as appropriate, but do not omit keys.
Provide your best estimate for numerical values."#,
        address = ctx.address,
        latitude = ctx.latitude,
        longitude = ctx.longitude,
        panel_area = PROMPT_PANEL_AREA_SQM,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RooftopAttributes;

    fn ctx() -> LocationContext {
        LocationContext {
            address: "42 Solar Way, Springfield".to_string(),
            latitude: 39.78,
            longitude: -89.65,
        }
    }

    #[test]
    fn test_prompt_carries_location() {
        let prompt = rooftop_prompt(&ctx());
        assert!(prompt.contains("Address: 42 Solar Way, Springfield"));
        assert!(prompt.contains("Latitude: 39.78"));
        assert!(prompt.contains("Longitude: -89.65"));
    }

    #[test]
    fn test_prompt_lists_vocabulary_and_all_keys() {
        let prompt = rooftop_prompt(&ctx());
        assert!(prompt.contains("'South-West'"));
        assert!(prompt.contains("'Multi-directional'"));
        assert!(prompt.contains("'negligible'"));
        assert!(prompt.contains("do not omit keys"));
        for key in RooftopAttributes::REQUIRED_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
        assert!(prompt.contains("\"confidence_score_percent\""));
    }
}
