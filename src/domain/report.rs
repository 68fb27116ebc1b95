use serde::{Serialize, Serializer};
use strum::Display;

/// Marker rendered in place of a payback period when a system never pays
/// for itself.
pub const PAYBACK_NOT_APPLICABLE: &str = "N/A (No savings)";

/// Qualitative solar potential of a rooftop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub enum SolarRating {
    High,
    Medium,
    Low,
}

/// Years needed to recover the net installation cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaybackPeriod {
    Years(f64),
    /// No electricity savings, so the system never pays back.
    NotApplicable,
}

impl PaybackPeriod {
    /// True only for a numeric payback strictly below `limit`.
    pub fn is_shorter_than(&self, limit: f64) -> bool {
        matches!(self, PaybackPeriod::Years(y) if *y < limit)
    }
}

impl Serialize for PaybackPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaybackPeriod::Years(y) => serializer.serialize_f64(*y),
            PaybackPeriod::NotApplicable => serializer.serialize_str(PAYBACK_NOT_APPLICABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct CostAnalysis {
    pub total_installation_cost_usd: f64,
    pub federal_tax_credit_amount_usd: f64,
    pub net_cost_after_incentives_usd: f64,
    pub estimated_annual_electricity_savings_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct RoiAnalysis {
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub payback_period_years: PaybackPeriod,
    pub total_savings_over_lifespan_usd: f64,
    pub roi_over_lifespan_usd: f64,
    pub roi_percentage: f64,
}

/// The parameter values a report was computed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct Assumptions {
    pub panel_efficiency_percent: f64,
    pub system_cost_per_watt_usd: f64,
    pub federal_tax_credit_percent: f64,
    pub average_electricity_price_kwh_usd: f64,
    pub system_lifespan_years: u32,
    pub degradation_rate_percent_per_year: f64,
    pub average_daily_peak_sun_hours: f64,
    pub panel_wattage_per_sqm: f64,
    pub typical_panel_area_sqm: f64,
}

/// Solar production and financial forecast for one rooftop.
///
/// Values are already rounded for presentation: currency and energy to two
/// decimals, payback and ROI percentage to one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct FinancialReport {
    pub solar_potential_rating: SolarRating,
    pub estimated_system_size_kw: f64,
    pub estimated_annual_kwh_production: f64,
    pub cost_analysis: CostAnalysis,
    pub roi_analysis: RoiAnalysis,
    pub assumptions: Assumptions,
    pub estimated_max_panel_count: u64,
}
