//! Rooftop feature extraction through an external vision oracle.

pub mod gemini;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{LocationContext, RooftopAttributes};
use crate::imagery::SatelliteImage;

pub use gemini::GeminiClient;

/// Oracle answer: the raw JSON object as returned plus the validated record.
#[derive(Debug, Clone, PartialEq)]
pub struct RooftopAnalysis {
    pub raw: Value,
    pub attributes: RooftopAttributes,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("vision oracle request timed out")]
    Timeout,
    #[error("vision oracle unreachable: {0}")]
    Unreachable(String),
    #[error("vision oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("vision oracle returned no content: {0}")]
    EmptyResponse(String),
    #[error("malformed AI output: {reason}; raw output: {excerpt}")]
    Malformed { reason: String, excerpt: String },
    #[error("incomplete AI output: missing or null keys {missing:?}")]
    Incomplete { missing: Vec<String> },
    #[error("invalid AI output field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to build vision request: {0}")]
    Request(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RooftopAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &SatelliteImage,
        location: &LocationContext,
    ) -> Result<RooftopAnalysis, ExtractionError>;
}
