//! Parsing and validation of the oracle's JSON answer.
//!
//! Required attributes are checked strictly; the descriptive ones are read
//! leniently because the oracle frequently answers "Unknown" where a number
//! was asked for.

use serde_json::{Map, Value};

use super::{ExtractionError, RooftopAnalysis};
use crate::domain::RooftopAttributes;
use crate::utils::{excerpt, MAX_EXCERPT_CHARS};

/// Parses raw oracle text into a validated analysis.
pub fn parse_oracle_output(text: &str) -> Result<RooftopAnalysis, ExtractionError> {
    let body = strip_code_fences(text);
    let raw: Value = serde_json::from_str(body).map_err(|e| ExtractionError::Malformed {
        reason: e.to_string(),
        excerpt: excerpt(text, MAX_EXCERPT_CHARS),
    })?;

    let attributes = validate(&raw).map_err(|e| match e {
        ExtractionError::Malformed { reason, .. } => ExtractionError::Malformed {
            reason,
            excerpt: excerpt(text, MAX_EXCERPT_CHARS),
        },
        other => other,
    })?;
    Ok(RooftopAnalysis { raw, attributes })
}

/// Checks the required keys and builds the typed record.
pub fn validate(raw: &Value) -> Result<RooftopAttributes, ExtractionError> {
    let obj = raw.as_object().ok_or_else(|| ExtractionError::Malformed {
        reason: "expected a JSON object".to_string(),
        excerpt: String::new(),
    })?;

    let missing: Vec<String> = RooftopAttributes::REQUIRED_KEYS
        .iter()
        .filter(|key| obj.get(**key).map_or(true, Value::is_null))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ExtractionError::Incomplete { missing });
    }

    Ok(RooftopAttributes {
        rooftop_shape: text_or(obj, "rooftop_shape", "Unknown"),
        approx_usable_area_sqm: obj["approx_usable_area_sqm"].clone(),
        dominant_orientation: as_text(&obj["dominant_orientation"]),
        shading_level: as_text(&obj["shading_level"]),
        shading_sources: text_list(obj, "shading_sources"),
        visible_obstructions: text_list(obj, "visible_obstructions"),
        panel_layout_suggestion: text_or(obj, "panel_layout_suggestion", ""),
        preliminary_feasibility_notes: text_or(obj, "preliminary_feasibility_notes", ""),
        estimated_max_panel_count: integer(obj, "estimated_max_panel_count")
            .and_then(|n| u32::try_from(n).ok()),
        is_suitable_for_solar: boolean(&obj["is_suitable_for_solar"]).ok_or_else(|| {
            ExtractionError::InvalidField {
                field: "is_suitable_for_solar",
                reason: format!("expected a boolean, got {}", obj["is_suitable_for_solar"]),
            }
        })?,
        confidence_score_percent: integer(obj, "confidence_score_percent")
            .filter(|n| *n <= 100)
            .map(|n| n as u8),
    })
}

/// Drops a surrounding Markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(v) => as_text(v),
    }
}

fn text_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(as_text)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn integer(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
