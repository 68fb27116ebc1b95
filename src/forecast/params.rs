//! Parameter Store: the named physical and financial assumptions behind the
//! financial model.
//!
//! Parameters are read once from a JSON document at startup. A missing,
//! unreadable, malformed or invalid document never stops the process; the
//! complete built-in set is used instead. Partial documents are not merged
//! with the defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::domain::{Orientation, ShadingLevel};

pub const UNKNOWN_ORIENTATION: &str = "Unknown";
pub const UNKNOWN_SHADING: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct CalculationParameters {
    #[validate(range(min = 0.0, max = 100.0))]
    pub panel_efficiency_percent: f64,
    #[validate(range(min = 0.0))]
    pub system_cost_per_watt_usd: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub federal_tax_credit_percent: f64,
    #[validate(range(min = 0.0))]
    pub average_electricity_price_kwh_usd: f64,
    #[validate(range(min = 1))]
    pub system_lifespan_years: u32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub degradation_rate_percent_per_year: f64,
    #[validate(range(min = 0.0, max = 24.0))]
    pub average_daily_peak_sun_hours: f64,
    #[validate(custom(function = "validate_shading_factors"))]
    pub shading_impact_factor: BTreeMap<String, f64>,
    #[validate(custom(function = "validate_orientation_factors"))]
    pub orientation_impact_factor: BTreeMap<String, f64>,
    #[validate(range(min = 0.0))]
    pub panel_wattage_per_sqm: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub typical_panel_area_sqm: f64,
}

impl CalculationParameters {
    /// The documented built-in assumption set.
    pub fn builtin() -> Self {
        let shading_impact_factor = ShadingLevel::iter()
            .map(|level| {
                let factor = match level {
                    ShadingLevel::Low | ShadingLevel::Negligible => 1.0,
                    ShadingLevel::Medium => 0.85,
                    ShadingLevel::High | ShadingLevel::Significant => 0.70,
                    ShadingLevel::Unknown => 0.90,
                };
                (level.to_string(), factor)
            })
            .collect();

        let orientation_impact_factor = Orientation::iter()
            .map(|orientation| {
                let factor = match orientation {
                    Orientation::South => 1.0,
                    Orientation::SouthEast | Orientation::SouthWest => 0.95,
                    Orientation::East | Orientation::West => 0.85,
                    Orientation::North => 0.60,
                    Orientation::Flat
                    | Orientation::MultiDirectional
                    | Orientation::Unknown => 0.90,
                };
                (orientation.to_string(), factor)
            })
            .collect();

        Self {
            panel_efficiency_percent: 20.0,
            system_cost_per_watt_usd: 3.0,
            federal_tax_credit_percent: 30.0,
            average_electricity_price_kwh_usd: 0.15,
            system_lifespan_years: 25,
            degradation_rate_percent_per_year: 0.5,
            average_daily_peak_sun_hours: 4.5,
            shading_impact_factor,
            orientation_impact_factor,
            panel_wattage_per_sqm: 200.0,
            typical_panel_area_sqm: 1.7,
        }
    }

    /// Factor for `orientation`, or the "Unknown" factor for an unrecognised key.
    pub fn orientation_factor(&self, orientation: &str) -> (&str, f64) {
        lookup(&self.orientation_impact_factor, orientation, UNKNOWN_ORIENTATION)
    }

    /// Factor for `shading_level`, or the "unknown" factor for an unrecognised key.
    pub fn shading_factor(&self, shading_level: &str) -> (&str, f64) {
        lookup(&self.shading_impact_factor, shading_level, UNKNOWN_SHADING)
    }
}

impl Default for CalculationParameters {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lookup<'a>(factors: &'a BTreeMap<String, f64>, key: &str, fallback: &'a str) -> (&'a str, f64) {
    match factors.get_key_value(key) {
        Some((k, v)) => (k.as_str(), *v),
        // Validation guarantees the fallback key for loaded sets; hand-built
        // sets without it get a neutral factor.
        None => (fallback, factors.get(fallback).copied().unwrap_or(1.0)),
    }
}

fn validate_factor_map(factors: &BTreeMap<String, f64>, fallback: &str) -> Result<(), ValidationError> {
    if !factors.contains_key(fallback) {
        let mut err = ValidationError::new("missing_fallback_key");
        err.message = Some(format!("factor map must contain \"{fallback}\"").into());
        return Err(err);
    }
    if let Some((key, _)) = factors.iter().find(|(_, v)| !(**v > 0.0 && **v <= 1.0)) {
        let mut err = ValidationError::new("factor_out_of_range");
        err.message = Some(format!("factor for \"{key}\" must be in (0, 1]").into());
        return Err(err);
    }
    Ok(())
}

fn validate_shading_factors(factors: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    validate_factor_map(factors, UNKNOWN_SHADING)
}

fn validate_orientation_factors(factors: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    validate_factor_map(factors, UNKNOWN_ORIENTATION)
}

#[derive(Debug, Error)]
pub enum ParameterLoadError {
    #[error("parameter file {0} not found")]
    Missing(PathBuf),
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed parameter file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid parameters: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Where the active parameter set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub enum ParameterSource {
    /// Path of the parameter document that was loaded.
    File(String),
    Builtin,
}

/// Owns the process-wide parameter set. Cheap to clone; readers share the
/// same immutable allocation.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    params: Arc<CalculationParameters>,
    source: ParameterSource,
}

impl ParameterStore {
    /// Loads parameters from `path`, falling back to the built-in set on any
    /// failure. Never fails.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match read_parameters(path) {
            Ok(params) => {
                info!(path = %path.display(), "loaded calculation parameters");
                Self {
                    params: Arc::new(params),
                    source: ParameterSource::File(path.display().to_string()),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using built-in calculation parameters");
                Self::builtin()
            }
        }
    }

    pub fn builtin() -> Self {
        Self::from_parameters(CalculationParameters::builtin(), ParameterSource::Builtin)
    }

    pub fn from_parameters(params: CalculationParameters, source: ParameterSource) -> Self {
        Self {
            params: Arc::new(params),
            source,
        }
    }

    pub fn parameters(&self) -> &CalculationParameters {
        &self.params
    }

    pub fn shared(&self) -> Arc<CalculationParameters> {
        Arc::clone(&self.params)
    }

    pub fn source(&self) -> &ParameterSource {
        &self.source
    }
}

fn read_parameters(path: &Path) -> Result<CalculationParameters, ParameterLoadError> {
    if !path.exists() {
        return Err(ParameterLoadError::Missing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let params: CalculationParameters = serde_json::from_str(&raw)?;
    params.validate()?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_builtin_is_valid() {
        let params = CalculationParameters::builtin();
        assert!(params.validate().is_ok());
        assert_eq!(params.shading_impact_factor.len(), 6);
        assert_eq!(params.orientation_impact_factor.len(), 9);
        assert_eq!(params.orientation_impact_factor["South-West"], 0.95);
        assert_eq!(params.shading_impact_factor["medium"], 0.85);
        assert_eq!(params.shading_impact_factor["negligible"], 1.0);
        assert_eq!(params.shading_impact_factor["significant"], 0.70);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let store = ParameterStore::load("/definitely/not/here/params.json");
        assert_eq!(store.source(), &ParameterSource::Builtin);
        assert_eq!(store.parameters(), &CalculationParameters::builtin());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let file = write_temp("{ \"panel_efficiency_percent\": 20.0, ");
        let store = ParameterStore::load(file.path());
        assert_eq!(store.source(), &ParameterSource::Builtin);
    }

    #[test]
    fn test_partial_file_is_not_merged() {
        let file = write_temp(r#"{ "average_electricity_price_kwh_usd": 0.30 }"#);
        let store = ParameterStore::load(file.path());
        assert_eq!(store.source(), &ParameterSource::Builtin);
        assert_eq!(store.parameters().average_electricity_price_kwh_usd, 0.15);
    }

    #[test]
    fn test_valid_file_is_used() {
        let mut params = CalculationParameters::builtin();
        params.average_electricity_price_kwh_usd = 0.30;
        let file = write_temp(&serde_json::to_string(&params).unwrap());

        let store = ParameterStore::load(file.path());
        assert_eq!(store.source(), &ParameterSource::File(file.path().display().to_string()));
        assert_eq!(store.parameters().average_electricity_price_kwh_usd, 0.30);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut params = CalculationParameters::builtin();
        params.system_lifespan_years = 0;
        let file = write_temp(&serde_json::to_string(&params).unwrap());
        assert_eq!(ParameterStore::load(file.path()).source(), &ParameterSource::Builtin);

        let mut params = CalculationParameters::builtin();
        params.orientation_impact_factor.remove("Unknown");
        let file = write_temp(&serde_json::to_string(&params).unwrap());
        assert_eq!(ParameterStore::load(file.path()).source(), &ParameterSource::Builtin);

        let mut params = CalculationParameters::builtin();
        params.shading_impact_factor.insert("high".to_string(), 1.5);
        let file = write_temp(&serde_json::to_string(&params).unwrap());
        assert_eq!(ParameterStore::load(file.path()).source(), &ParameterSource::Builtin);
    }

    #[test]
    fn test_array_wrapped_document_falls_back() {
        let params = CalculationParameters::builtin();
        let file = write_temp(&format!("[{}]", serde_json::to_string(&params).unwrap()));
        assert_eq!(ParameterStore::load(file.path()).source(), &ParameterSource::Builtin);
    }

    #[test]
    fn test_factor_lookup_falls_back_to_unknown() {
        let params = CalculationParameters::builtin();
        assert_eq!(params.orientation_factor("South"), ("South", 1.0));
        assert_eq!(params.orientation_factor("south"), ("Unknown", 0.90));
        assert_eq!(params.shading_factor("High"), ("unknown", 0.90));
        assert_eq!(params.shading_factor("high"), ("high", 0.70));
    }

    #[test]
    fn test_shipped_parameter_file_matches_builtin() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/default_params.json");
        let store = ParameterStore::load(path);
        assert!(matches!(store.source(), ParameterSource::File(_)));
        assert_eq!(store.parameters(), &CalculationParameters::builtin());
    }
}
