//! Assessment pipeline: image acquisition, feature extraction and the
//! financial model, run in order for a single request.
//!
//! Every stage failure aborts the request; nothing is retried here. The one
//! local recovery is a non-numeric usable area, which degrades to 0 m².

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use strum::Display;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AssessmentRequest, AssessmentResponse, FinancialReport, LocationContext};
use crate::forecast::{self, CalculationParameters};
use crate::imagery::{ImageProvider, ImageryError, MapView};
use crate::vision::{ExtractionError, RooftopAnalyzer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(serialize = "image acquisition")]
    ImageAcquisition,
    #[strum(serialize = "feature extraction")]
    FeatureExtraction,
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Provider unreachable or answered with a non-success status.
    #[error("{stage} provider unavailable: {detail}")]
    UpstreamUnavailable {
        stage: Stage,
        status: Option<u16>,
        detail: String,
    },
    #[error("{stage} provider timed out")]
    UpstreamTimeout { stage: Stage },
    /// Provider answered, but with something unusable.
    #[error("invalid {stage} payload: {detail}")]
    InvalidUpstreamPayload { stage: Stage, detail: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ImageryError> for AssessmentError {
    fn from(e: ImageryError) -> Self {
        let stage = Stage::ImageAcquisition;
        match e {
            ImageryError::Timeout => AssessmentError::UpstreamTimeout { stage },
            ImageryError::Unreachable(detail) => AssessmentError::UpstreamUnavailable {
                stage,
                status: None,
                detail,
            },
            ImageryError::Status { status, body } => AssessmentError::UpstreamUnavailable {
                stage,
                status: Some(status),
                detail: format!("HTTP {status}: {body}"),
            },
            e @ ImageryError::InvalidImage { .. } => AssessmentError::InvalidUpstreamPayload {
                stage,
                detail: format!("{e}. Check API key and quota."),
            },
            ImageryError::Request(detail) => AssessmentError::Internal(detail),
        }
    }
}

impl From<ExtractionError> for AssessmentError {
    fn from(e: ExtractionError) -> Self {
        let stage = Stage::FeatureExtraction;
        match e {
            ExtractionError::Timeout => AssessmentError::UpstreamTimeout { stage },
            ExtractionError::Unreachable(detail) => AssessmentError::UpstreamUnavailable {
                stage,
                status: None,
                detail,
            },
            ExtractionError::Status { status, body } => AssessmentError::UpstreamUnavailable {
                stage,
                status: Some(status),
                detail: format!("HTTP {status}: {body}"),
            },
            ExtractionError::Request(detail) => AssessmentError::Internal(detail),
            e @ (ExtractionError::EmptyResponse(_)
            | ExtractionError::Malformed { .. }
            | ExtractionError::Incomplete { .. }
            | ExtractionError::InvalidField { .. }) => AssessmentError::InvalidUpstreamPayload {
                stage,
                detail: e.to_string(),
            },
        }
    }
}

pub struct AssessmentPipeline {
    imagery: Arc<dyn ImageProvider>,
    analyzer: Arc<dyn RooftopAnalyzer>,
    params: Arc<CalculationParameters>,
    view: MapView,
}

impl AssessmentPipeline {
    pub fn new(
        imagery: Arc<dyn ImageProvider>,
        analyzer: Arc<dyn RooftopAnalyzer>,
        params: Arc<CalculationParameters>,
        view: MapView,
    ) -> Self {
        Self {
            imagery,
            analyzer,
            params,
            view,
        }
    }

    pub fn parameters(&self) -> &CalculationParameters {
        &self.params
    }

    #[instrument(
        skip(self, request),
        fields(address = %request.address, latitude = request.latitude, longitude = request.longitude)
    )]
    pub async fn assess(
        &self,
        request: AssessmentRequest,
    ) -> Result<AssessmentResponse, AssessmentError> {
        info!("assessment started");

        let image = self
            .imagery
            .fetch(request.latitude, request.longitude, self.view)
            .await?;

        let location = LocationContext::from(&request);
        let analysis = self.analyzer.analyze(&image, &location).await?;
        let attributes = &analysis.attributes;

        let (usable_area_sqm, degraded) = match coerce_usable_area(&attributes.approx_usable_area_sqm) {
            Some(area) => (area, false),
            None => {
                warn!(
                    value = %attributes.approx_usable_area_sqm,
                    "approx_usable_area_sqm is not numeric, using 0"
                );
                (0.0, true)
            }
        };

        let report = forecast::calculate(
            usable_area_sqm,
            &attributes.dominant_orientation,
            &attributes.shading_level,
            &self.params,
        );

        info!(
            rating = %report.solar_potential_rating,
            system_size_kw = report.estimated_system_size_kw,
            annual_kwh = report.estimated_annual_kwh_production,
            "assessment complete"
        );

        Ok(AssessmentResponse {
            assessment_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            overall_message: summary_line(&report, degraded),
            request_details: request,
            ai_image_analysis: analysis.raw,
            solar_financial_analysis: report,
        })
    }
}

/// Reads the oracle's usable-area estimate as square metres.
///
/// Numbers and numeric strings are accepted; anything else, including
/// non-finite values, yields `None`.
pub fn coerce_usable_area(value: &Value) -> Option<f64> {
    let area = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    area.is_finite().then_some(area)
}

pub fn summary_line(report: &FinancialReport, area_degraded: bool) -> String {
    let mut line = format!(
        "Rooftop analysis complete: {} solar potential, estimated {:.2} kW system producing about {:.0} kWh per year.",
        report.solar_potential_rating,
        report.estimated_system_size_kw,
        report.estimated_annual_kwh_production,
    );
    if area_degraded {
        line.push_str(" The usable roof area could not be read from the image analysis, so figures assume 0 sqm.");
    }
    line
}
