//! Gemini `generateContent` client used as the rooftop vision oracle.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{parse, ExtractionError, RooftopAnalysis, RooftopAnalyzer};
use crate::config::VisionConfig;
use crate::domain::LocationContext;
use crate::imagery::SatelliteImage;
use crate::utils::{excerpt, redact, MAX_EXCERPT_CHARS};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(cfg: &VisionConfig) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("solar-rooftop-analyzer/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&cfg.api_key)
            .map_err(|_| ExtractionError::Request("API key is not a valid header value".to_string()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.vision_model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn map_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Timeout
        } else if e.is_builder() {
            ExtractionError::Request(redact(&e.to_string(), &self.api_key))
        } else {
            ExtractionError::Unreachable(redact(&e.without_url().to_string(), &self.api_key))
        }
    }
}

#[async_trait]
impl RooftopAnalyzer for GeminiClient {
    async fn analyze(
        &self,
        image: &SatelliteImage,
        location: &LocationContext,
    ) -> Result<RooftopAnalysis, ExtractionError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: super::prompt::rooftop_prompt(location),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type(),
                            data: STANDARD.encode(&image.bytes),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.model, image_bytes = image.bytes.len(), "requesting rooftop analysis");

        let resp = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_error(e))?;
        if !status.is_success() {
            let body = excerpt(&redact(&body, &self.api_key), MAX_EXCERPT_CHARS);
            warn!(status = status.as_u16(), %body, "vision oracle returned error status");
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ExtractionError::EmptyResponse(format!(
                "unexpected response envelope ({e}): {}",
                excerpt(&body, MAX_EXCERPT_CHARS)
            ))
        })?;
        let text = envelope.into_text()?;
        debug!(raw_output = %excerpt(&text, MAX_EXCERPT_CHARS), "vision oracle answered");

        let analysis = parse::parse_oracle_output(&text).map_err(|e| {
            warn!(error = %e, "vision oracle output rejected");
            e
        })?;
        info!(
            orientation = %analysis.attributes.dominant_orientation,
            shading = %analysis.attributes.shading_level,
            suitable = analysis.attributes.is_suitable_for_solar,
            "rooftop analysis received"
        );
        Ok(analysis)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, ExtractionError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ExtractionError::EmptyResponse(match block_reason {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "no candidates".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse(format!(
                "finish reason {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}
