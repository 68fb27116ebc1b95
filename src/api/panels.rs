use axum::{extract::rejection::PathRejection, extract::Path, Json};

use super::error::ApiError;
use crate::catalog;
use crate::domain::SolarPanel;

/// GET /api/solar-panels
#[cfg_attr(feature = "swagger", utoipa::path(
    get,
    path = "/api/solar-panels",
    responses((status = 200, description = "Panel catalog", body = [SolarPanel]))
))]
pub async fn list_panels() -> Json<&'static [SolarPanel]> {
    Json(catalog::all())
}

/// GET /api/solar-panels/:id
#[cfg_attr(feature = "swagger", utoipa::path(
    get,
    path = "/api/solar-panels/{id}",
    params(("id" = i64, Path, description = "Catalog id")),
    responses(
        (status = 200, description = "Panel found", body = SolarPanel),
        (status = 404, description = "Unknown panel id")
    )
))]
pub async fn get_panel(
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<&'static SolarPanel>, ApiError> {
    let Path(id) = id?;
    catalog::find(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Solar panel not found".to_string()))
}
