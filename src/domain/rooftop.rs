use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

/// Dominant roof-face orientation as reported by the vision oracle.
///
/// The string forms are the keys of `orientation_impact_factor` and are
/// case-sensitive ("South-West", not "south-west").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub enum Orientation {
    South,
    #[strum(serialize = "South-East")]
    SouthEast,
    #[strum(serialize = "South-West")]
    SouthWest,
    East,
    West,
    North,
    Flat,
    #[strum(serialize = "Multi-directional")]
    MultiDirectional,
    Unknown,
}

/// Shading bucket. Lower-case on the wire, matching `shading_impact_factor`.
///
/// `Negligible`/`Low` and `Significant`/`High` stay distinct keys even though
/// the built-in factors happen to coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub enum ShadingLevel {
    Low,
    Medium,
    High,
    Negligible,
    Significant,
    Unknown,
}

/// Validated structured output of the feature-extraction oracle.
///
/// The four required attributes (`approx_usable_area_sqm`,
/// `dominant_orientation`, `shading_level`, `is_suitable_for_solar`) are
/// guaranteed present and non-null. `approx_usable_area_sqm` is kept as the
/// raw JSON value: numeric coercion is the pipeline's decision, not the
/// extractor's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct RooftopAttributes {
    pub rooftop_shape: String,
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub approx_usable_area_sqm: Value,
    pub dominant_orientation: String,
    pub shading_level: String,
    pub shading_sources: Vec<String>,
    pub visible_obstructions: Vec<String>,
    pub panel_layout_suggestion: String,
    pub preliminary_feasibility_notes: String,
    pub estimated_max_panel_count: Option<u32>,
    pub is_suitable_for_solar: bool,
    pub confidence_score_percent: Option<u8>,
}

impl RooftopAttributes {
    pub const REQUIRED_KEYS: [&'static str; 4] = [
        "approx_usable_area_sqm",
        "dominant_orientation",
        "shading_level",
        "is_suitable_for_solar",
    ];
}
