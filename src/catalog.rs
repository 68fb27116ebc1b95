//! Read-only catalog of panel models served by `/api/solar-panels`.

use crate::domain::SolarPanel;

static PANELS: &[SolarPanel] = &[
    SolarPanel {
        id: 1,
        model: "EcoSun 400",
        manufacturer: Some("EcoSun"),
        peak_power_watts: 400,
        efficiency_percent: 20.5,
        cost_per_watt_usd: 0.85,
        warranty_years: Some(25),
    },
    SolarPanel {
        id: 2,
        model: "PowerCell 380",
        manufacturer: Some("PowerCell"),
        peak_power_watts: 380,
        efficiency_percent: 19.8,
        cost_per_watt_usd: 0.78,
        warranty_years: Some(20),
    },
];

pub fn all() -> &'static [SolarPanel] {
    PANELS
}

/// Any integer is a valid key; negative or oversized ids simply miss.
pub fn find(id: i64) -> Option<&'static SolarPanel> {
    PANELS.iter().find(|p| i64::from(p.id) == id)
}
