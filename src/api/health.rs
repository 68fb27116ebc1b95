use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::forecast::ParameterSource;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    models: Models,
    parameters: ParameterSource,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct Models {
    vision: String,
    text: String,
}

/// GET / - liveness marker
#[cfg_attr(feature = "swagger", utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running"))
))]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Solar rooftop analyzer is running" }))
}

/// GET /health - configuration-level health
///
/// Reports the configured models and where the calculation parameters were
/// loaded from. Providers are not probed; a failing provider surfaces on
/// the next assessment instead.
#[cfg_attr(feature = "swagger", utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse))
))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        models: Models {
            vision: state.models.vision_model.clone(),
            text: state.models.text_model.clone(),
        },
        parameters: state.params.source().clone(),
    };

    tracing::debug!(parameters = ?response.parameters, "Health check completed");
    Json(response)
}
