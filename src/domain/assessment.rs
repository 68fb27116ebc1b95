use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::FinancialReport;

/// Incoming rooftop assessment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct AssessmentRequest {
    #[validate(length(min = 1, message = "address must not be empty"))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Location hints handed to the vision oracle alongside the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationContext {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&AssessmentRequest> for LocationContext {
    fn from(req: &AssessmentRequest) -> Self {
        Self {
            address: req.address.clone(),
            latitude: req.latitude,
            longitude: req.longitude,
        }
    }
}

/// Result of one assessment: the request echoed back, the oracle's raw
/// answer, the financial model output and a one-line summary.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
pub struct AssessmentResponse {
    pub assessment_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub request_details: AssessmentRequest,
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub ai_image_analysis: Value,
    pub solar_financial_analysis: FinancialReport,
    pub overall_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lat: f64, lon: f64) -> AssessmentRequest {
        AssessmentRequest {
            address: "1 Sunny Lane".to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_request_coordinate_bounds() {
        assert!(request(37.42, -122.08).validate().is_ok());
        assert!(request(90.0, 180.0).validate().is_ok());
        assert!(request(-90.0, -180.0).validate().is_ok());
        assert!(request(90.5, 0.0).validate().is_err());
        assert!(request(0.0, -180.1).validate().is_err());
    }

    #[test]
    fn test_request_requires_address() {
        let mut req = request(10.0, 10.0);
        req.address.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_location_context_from_request() {
        let ctx = LocationContext::from(&request(51.5, -0.12));
        assert_eq!(ctx.address, "1 Sunny Lane");
        assert_eq!(ctx.latitude, 51.5);
        assert_eq!(ctx.longitude, -0.12);
    }
}
