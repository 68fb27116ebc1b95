use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::imagery::MapView;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub imagery: ImageryConfig,
    pub vision: VisionConfig,
    pub parameters: ParametersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Static-map satellite imagery provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageryConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub timeout_seconds: u64,
}

impl ImageryConfig {
    pub fn map_view(&self) -> MapView {
        MapView {
            zoom: self.zoom,
            width: self.width,
            height: self.height,
        }
    }
}

/// Vision oracle used for rooftop feature extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub vision_model: String,
    pub text_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParametersConfig {
    pub path: PathBuf,
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("{0} environment variable must be set")]
    MissingCredential(&'static str),
    #[error("invalid listen address {0}")]
    InvalidAddress(String),
}

impl Config {
    /// Layers `config/default.toml`, `SOLAR__`-prefixed variables and the
    /// provider's own well-known variables, in increasing precedence.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Toml::file("config/default.toml"))
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    pub fn figment(base: impl figment::Provider) -> Figment {
        Figment::new()
            .merge(base)
            .merge(Env::prefixed("SOLAR__").split("__"))
            .merge(alias("GEMINI_API_KEY", "vision.api_key"))
            .merge(alias("GEMINI_VISION_MODEL", "vision.vision_model"))
            .merge(alias("GEMINI_TEXT_MODEL", "vision.text_model"))
            .merge(alias("MAPS_STATIC_API_KEY", "imagery.api_key"))
    }

    /// Rejects configurations that cannot serve a single request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("GEMINI_API_KEY"));
        }
        if self.imagery.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("MAPS_STATIC_API_KEY"));
        }
        Ok(())
    }
}

fn alias(var: &'static str, key: &'static str) -> Env {
    Env::raw().only(&[var]).map(move |_| key.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const BASE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8000

        [imagery]
        base_url = "https://maps.example/staticmap"
        zoom = 19
        width = 640
        height = 640
        timeout_seconds = 10

        [vision]
        base_url = "https://vision.example/v1beta"
        vision_model = "gemini-1.5-flash"
        text_model = "gemini-1.5-flash"
        timeout_seconds = 60

        [parameters]
        path = "data/default_params.json"
    "#;

    #[test]
    fn test_well_known_variables_are_mapped() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", BASE)?;
            jail.set_env("GEMINI_API_KEY", "g-key");
            jail.set_env("MAPS_STATIC_API_KEY", "m-key");
            jail.set_env("GEMINI_VISION_MODEL", "gemini-pro-vision");

            let cfg: Config = Config::figment(Toml::file("config.toml")).extract()?;
            assert_eq!(cfg.vision.api_key, "g-key");
            assert_eq!(cfg.imagery.api_key, "m-key");
            assert_eq!(cfg.vision.vision_model, "gemini-pro-vision");
            assert_eq!(cfg.vision.text_model, "gemini-1.5-flash");
            assert!(cfg.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_variables_override_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", BASE)?;
            jail.set_env("SOLAR__SERVER__PORT", "9100");
            jail.set_env("SOLAR__IMAGERY__ZOOM", "20");

            let cfg: Config = Config::figment(Toml::file("config.toml")).extract()?;
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.imagery.map_view().zoom, 20);
            assert_eq!(cfg.server.request_timeout_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", BASE)?;
            jail.set_env("MAPS_STATIC_API_KEY", "m-key");

            let cfg: Config = Config::figment(Toml::file("config.toml")).extract()?;
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::MissingCredential("GEMINI_API_KEY"))
            ));
            Ok(())
        });
    }
}
