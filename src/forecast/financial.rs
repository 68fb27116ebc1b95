//! Solar potential financial model.
//!
//! Pure and deterministic: turns usable roof area, orientation and shading
//! into system size, yearly yield, cost, payback and lifetime ROI. Values are
//! accumulated at full precision and rounded once when the report is built.

use crate::domain::{
    Assumptions, CostAnalysis, FinancialReport, PaybackPeriod, RoiAnalysis, SolarRating,
};

use super::CalculationParameters;

const DAYS_PER_YEAR: f64 = 365.0;
const WATTS_PER_KW: f64 = 1000.0;

const HIGH_MIN_ANNUAL_KWH: f64 = 5000.0;
const HIGH_MAX_PAYBACK_YEARS: f64 = 10.0;
const MEDIUM_MIN_ANNUAL_KWH: f64 = 2000.0;
const MEDIUM_MAX_PAYBACK_YEARS: f64 = 15.0;

/// Unrounded intermediate figures of one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub usable_area_sqm: f64,
    pub orientation: String,
    pub shading_level: String,
    pub system_size_kw: f64,
    pub production_adjustment: f64,
    pub annual_kwh: f64,
    pub installation_cost_usd: f64,
    pub tax_credit_usd: f64,
    pub net_cost_usd: f64,
    pub annual_savings_usd: f64,
    pub payback: PaybackPeriod,
    pub lifetime_savings_usd: f64,
    pub roi_usd: f64,
    pub roi_percent: f64,
    pub max_panel_count: u64,
}

/// Runs the model and returns the presentation-rounded report.
pub fn calculate(
    usable_area_sqm: f64,
    orientation: &str,
    shading_level: &str,
    params: &CalculationParameters,
) -> FinancialReport {
    project(usable_area_sqm, orientation, shading_level, params).into_report(params)
}

/// Runs the model without rounding.
pub fn project(
    usable_area_sqm: f64,
    orientation: &str,
    shading_level: &str,
    params: &CalculationParameters,
) -> Projection {
    // NaN compares false, so it clamps to zero along with negatives.
    let usable_area_sqm = if usable_area_sqm > 0.0 { usable_area_sqm } else { 0.0 };

    let (orientation, orientation_factor) = params.orientation_factor(orientation);
    let (shading_level, shading_factor) = params.shading_factor(shading_level);

    let total_panel_wattage = usable_area_sqm * params.panel_wattage_per_sqm;
    let system_size_kw = total_panel_wattage / WATTS_PER_KW;

    let production_adjustment = shading_factor * orientation_factor;
    let annual_kwh = system_size_kw
        * params.average_daily_peak_sun_hours
        * DAYS_PER_YEAR
        * production_adjustment;

    let installation_cost_usd = system_size_kw * params.system_cost_per_watt_usd * WATTS_PER_KW;
    let tax_credit_usd = installation_cost_usd * (params.federal_tax_credit_percent / 100.0);
    let net_cost_usd = installation_cost_usd - tax_credit_usd;

    let annual_savings_usd = annual_kwh * params.average_electricity_price_kwh_usd;
    let payback = if annual_savings_usd > 0.0 {
        PaybackPeriod::Years(net_cost_usd / annual_savings_usd)
    } else {
        PaybackPeriod::NotApplicable
    };

    let lifetime_savings_usd = lifetime_savings(
        annual_kwh,
        params.average_electricity_price_kwh_usd,
        params.degradation_rate_percent_per_year,
        params.system_lifespan_years,
    );

    let roi_usd = lifetime_savings_usd - net_cost_usd;
    let roi_percent = if net_cost_usd > 0.0 {
        roi_usd / net_cost_usd * 100.0
    } else {
        0.0
    };

    let max_panel_count = if params.typical_panel_area_sqm > 0.0 {
        (usable_area_sqm / params.typical_panel_area_sqm).floor() as u64
    } else {
        0
    };

    Projection {
        usable_area_sqm,
        orientation: orientation.to_string(),
        shading_level: shading_level.to_string(),
        system_size_kw,
        production_adjustment,
        annual_kwh,
        installation_cost_usd,
        tax_credit_usd,
        net_cost_usd,
        annual_savings_usd,
        payback,
        lifetime_savings_usd,
        roi_usd,
        roi_percent,
        max_panel_count,
    }
}

/// Savings summed over the system lifetime with output compounding down by
/// the degradation rate every year after the first.
pub fn lifetime_savings(
    first_year_kwh: f64,
    price_per_kwh: f64,
    degradation_percent_per_year: f64,
    lifespan_years: u32,
) -> f64 {
    let retention = 1.0 - degradation_percent_per_year / 100.0;
    let mut production = first_year_kwh;
    let mut total = 0.0;
    for _ in 0..lifespan_years {
        total += production * price_per_kwh;
        production *= retention;
    }
    total
}

/// First matching tier wins; both thresholds are strict.
pub fn rate(annual_kwh: f64, payback: PaybackPeriod) -> SolarRating {
    if annual_kwh > HIGH_MIN_ANNUAL_KWH && payback.is_shorter_than(HIGH_MAX_PAYBACK_YEARS) {
        SolarRating::High
    } else if annual_kwh > MEDIUM_MIN_ANNUAL_KWH
        && payback.is_shorter_than(MEDIUM_MAX_PAYBACK_YEARS)
    {
        SolarRating::Medium
    } else {
        SolarRating::Low
    }
}

impl Projection {
    pub fn rating(&self) -> SolarRating {
        rate(self.annual_kwh, self.payback)
    }

    pub fn into_report(self, params: &CalculationParameters) -> FinancialReport {
        let rating = self.rating();
        let payback = match self.payback {
            PaybackPeriod::Years(y) => PaybackPeriod::Years(round_to(y, 1)),
            PaybackPeriod::NotApplicable => PaybackPeriod::NotApplicable,
        };

        FinancialReport {
            solar_potential_rating: rating,
            estimated_system_size_kw: round_to(self.system_size_kw, 2),
            estimated_annual_kwh_production: round_to(self.annual_kwh, 2),
            cost_analysis: CostAnalysis {
                total_installation_cost_usd: round_to(self.installation_cost_usd, 2),
                federal_tax_credit_amount_usd: round_to(self.tax_credit_usd, 2),
                net_cost_after_incentives_usd: round_to(self.net_cost_usd, 2),
                estimated_annual_electricity_savings_usd: round_to(self.annual_savings_usd, 2),
            },
            roi_analysis: RoiAnalysis {
                payback_period_years: payback,
                total_savings_over_lifespan_usd: round_to(self.lifetime_savings_usd, 2),
                roi_over_lifespan_usd: round_to(self.roi_usd, 2),
                roi_percentage: round_to(self.roi_percent, 1),
            },
            assumptions: Assumptions::from(params),
            estimated_max_panel_count: self.max_panel_count,
        }
    }
}

impl From<&CalculationParameters> for Assumptions {
    fn from(p: &CalculationParameters) -> Self {
        Self {
            panel_efficiency_percent: p.panel_efficiency_percent,
            system_cost_per_watt_usd: p.system_cost_per_watt_usd,
            federal_tax_credit_percent: p.federal_tax_credit_percent,
            average_electricity_price_kwh_usd: p.average_electricity_price_kwh_usd,
            system_lifespan_years: p.system_lifespan_years,
            degradation_rate_percent_per_year: p.degradation_rate_percent_per_year,
            average_daily_peak_sun_hours: p.average_daily_peak_sun_hours,
            panel_wattage_per_sqm: p.panel_wattage_per_sqm,
            typical_panel_area_sqm: p.typical_panel_area_sqm,
        }
    }
}

/// Rounds the exact stored double to `decimals` places.
fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
