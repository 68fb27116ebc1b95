use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::error::ApiError;
use crate::domain::{AssessmentRequest, AssessmentResponse, FinancialReport};
use crate::forecast::{self, CalculationParameters, ParameterSource};
use crate::state::AppState;

/// POST /api/analyze-rooftop
#[cfg_attr(feature = "swagger", utoipa::path(
    post,
    path = "/api/analyze-rooftop",
    request_body = AssessmentRequest,
    responses(
        (status = 200, description = "Assessment complete", body = AssessmentResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Imagery or vision provider unavailable"),
        (status = 504, description = "Provider timed out"),
        (status = 500, description = "Unusable provider output or internal error")
    )
))]
pub async fn analyze_rooftop(
    State(state): State<AppState>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let response = state.pipeline.assess(request).await?;
    Ok(Json(response))
}

/// Inputs for running the financial model without imagery.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct PotentialRequest {
    #[validate(range(min = 0.0, message = "usable_area_sqm must not be negative"))]
    pub usable_area_sqm: f64,
    pub orientation: String,
    pub shading_level: String,
}

/// POST /api/calculate-potential
#[cfg_attr(feature = "swagger", utoipa::path(
    post,
    path = "/api/calculate-potential",
    request_body = PotentialRequest,
    responses(
        (status = 200, description = "Financial report", body = FinancialReport),
        (status = 400, description = "Invalid request")
    )
))]
pub async fn calculate_potential(
    State(state): State<AppState>,
    payload: Result<Json<PotentialRequest>, JsonRejection>,
) -> Result<Json<FinancialReport>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    if !req.usable_area_sqm.is_finite() {
        return Err(ApiError::ValidationError(
            "usable_area_sqm must be a finite number".to_string(),
        ));
    }

    let report = forecast::calculate(
        req.usable_area_sqm,
        &req.orientation,
        &req.shading_level,
        state.params.parameters(),
    );
    info!(
        area_sqm = req.usable_area_sqm,
        rating = %report.solar_potential_rating,
        "potential calculated"
    );
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct ParametersResponse {
    pub source: ParameterSource,
    pub parameters: CalculationParameters,
}

/// GET /api/parameters
#[cfg_attr(feature = "swagger", utoipa::path(
    get,
    path = "/api/parameters",
    responses((status = 200, description = "Active calculation parameters", body = ParametersResponse))
))]
pub async fn get_parameters(State(state): State<AppState>) -> Json<ParametersResponse> {
    Json(ParametersResponse {
        source: state.params.source().clone(),
        parameters: state.params.parameters().clone(),
    })
}
