use utoipa::OpenApi;

use crate::api::assessment::{ParametersResponse, PotentialRequest};
use crate::api::health::{HealthResponse, Models};
use crate::domain::{
    AssessmentRequest, AssessmentResponse, Assumptions, CostAnalysis, FinancialReport,
    RoiAnalysis, SolarPanel, SolarRating,
};
use crate::forecast::{CalculationParameters, ParameterSource};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::root,
        crate::api::health::health_check,
        crate::api::assessment::analyze_rooftop,
        crate::api::assessment::calculate_potential,
        crate::api::assessment::get_parameters,
        crate::api::panels::list_panels,
        crate::api::panels::get_panel,
    ),
    components(
        schemas(
            AssessmentRequest, AssessmentResponse, FinancialReport, CostAnalysis,
            RoiAnalysis, Assumptions, SolarRating, SolarPanel, PotentialRequest,
            ParametersResponse, CalculationParameters, ParameterSource,
            HealthResponse, Models
        )
    ),
    tags((name = "solar", description = "Solar rooftop analyzer API"))
)]
pub struct ApiDoc;
