use serde::Serialize;

/// Solar panel model from the static catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct SolarPanel {
    pub id: u32,
    pub model: &'static str,
    pub manufacturer: Option<&'static str>,
    pub peak_power_watts: u32,
    pub efficiency_percent: f64,
    pub cost_per_watt_usd: f64,
    pub warranty_years: Option<u32>,
}
