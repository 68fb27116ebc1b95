//! Satellite image acquisition.

pub mod format;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ImageryConfig;
use crate::utils::{excerpt, redact, MAX_EXCERPT_CHARS};

pub use format::{ImageFormat, ImageFormatError, ImageInfo};

/// Zoom level and pixel size of the requested map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapView {
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            zoom: 19,
            width: 640,
            height: 640,
        }
    }
}

impl MapView {
    fn size_param(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// A downloaded image whose framing has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteImage {
    pub bytes: Vec<u8>,
    pub info: ImageInfo,
}

impl SatelliteImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageFormatError> {
        let info = format::inspect(&bytes)?;
        Ok(Self { bytes, info })
    }

    pub fn mime_type(&self) -> &'static str {
        self.info.format.mime_type()
    }
}

#[derive(Debug, Error)]
pub enum ImageryError {
    #[error("image provider request timed out")]
    Timeout,
    #[error("image provider unreachable: {0}")]
    Unreachable(String),
    #[error("image provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("image fetch failed (HTTP {status}): {reason}; body: {body}")]
    InvalidImage {
        status: u16,
        reason: ImageFormatError,
        body: String,
    },
    #[error("failed to build image request: {0}")]
    Request(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        view: MapView,
    ) -> Result<SatelliteImage, ImageryError>;
}

/// Static-map satellite imagery over HTTP.
#[derive(Clone)]
pub struct StaticMapsClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl StaticMapsClient {
    pub fn new(cfg: &ImageryConfig) -> Result<Self, ImageryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("solar-rooftop-analyzer/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| ImageryError::Request(e.to_string()))?;
        Ok(Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            client,
        })
    }

    fn map_error(&self, e: reqwest::Error) -> ImageryError {
        if e.is_timeout() {
            ImageryError::Timeout
        } else if e.is_builder() {
            ImageryError::Request(redact(&e.to_string(), &self.api_key))
        } else {
            ImageryError::Unreachable(redact(&e.without_url().to_string(), &self.api_key))
        }
    }

    fn body_excerpt(&self, body: &[u8]) -> String {
        let text = String::from_utf8_lossy(body);
        excerpt(&redact(&text, &self.api_key), MAX_EXCERPT_CHARS)
    }
}

#[async_trait]
impl ImageProvider for StaticMapsClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        view: MapView,
    ) -> Result<SatelliteImage, ImageryError> {
        let center = format!("{latitude},{longitude}");
        let zoom = view.zoom.to_string();
        let size = view.size_param();
        debug!(
            base_url = %self.base_url,
            %center,
            %zoom,
            %size,
            "fetching satellite image"
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("center", center.as_str()),
                ("zoom", zoom.as_str()),
                ("size", size.as_str()),
                ("maptype", "satellite"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            let body = self.body_excerpt(&body);
            warn!(status = status.as_u16(), %body, "image provider returned error status");
            return Err(ImageryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match SatelliteImage::from_bytes(body.to_vec()) {
            Ok(image) => {
                info!(
                    format = %image.info.format,
                    width = image.info.width,
                    height = image.info.height,
                    bytes = image.bytes.len(),
                    "satellite image fetched"
                );
                Ok(image)
            }
            Err(reason) => {
                let body = self.body_excerpt(&body);
                warn!(status = status.as_u16(), %reason, %body, "image provider returned a non-image payload");
                Err(ImageryError::InvalidImage {
                    status: status.as_u16(),
                    reason,
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ImageryConfig {
        ImageryConfig {
            base_url: format!("{}/maps/api/staticmap", server.uri()),
            api_key: "maps-secret-key".to_string(),
            zoom: 19,
            width: 640,
            height: 640,
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_fetch_valid_png() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/staticmap"))
            .and(query_param("center", "37.42,-122.08"))
            .and(query_param("zoom", "19"))
            .and(query_param("size", "640x640"))
            .and(query_param("maptype", "satellite"))
            .and(query_param("key", "maps-secret-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format::tests::png(640, 640), "image/png"),
            )
            .mount(&server)
            .await;

        let client = StaticMapsClient::new(&config(&server)).unwrap();
        let image = client.fetch(37.42, -122.08, MapView::default()).await.unwrap();
        assert_eq!(image.info.format, ImageFormat::Png);
        assert_eq!(image.info.width, 640);
        assert_eq!(image.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_error_body_dressed_as_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"error_message":"The provided API key maps-secret-key is invalid."}"#,
            ))
            .mount(&server)
            .await;

        let client = StaticMapsClient::new(&config(&server)).unwrap();
        let err = client.fetch(1.0, 2.0, MapView::default()).await.unwrap_err();
        match err {
            ImageryError::InvalidImage { status, reason, body } => {
                assert_eq!(status, 200);
                assert_eq!(reason, ImageFormatError::UnknownFormat);
                assert!(body.contains("is invalid"));
                assert!(!body.contains("maps-secret-key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = StaticMapsClient::new(&config(&server)).unwrap();
        let err = client.fetch(1.0, 2.0, MapView::default()).await.unwrap_err();
        assert!(matches!(err, ImageryError::Status { status: 403, ref body } if body == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format::tests::png(8, 8), "image/png")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.timeout_seconds = 1;
        let client = StaticMapsClient::new(&cfg).unwrap();
        let err = client.fetch(1.0, 2.0, MapView::default()).await.unwrap_err();
        assert!(matches!(err, ImageryError::Timeout));
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = StaticMapsClient::new(&config(&server)).unwrap();
        let err = client.fetch(1.0, 2.0, MapView::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ImageryError::InvalidImage { reason: ImageFormatError::Empty, .. }
        ));
    }
}
