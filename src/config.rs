/// Application configuration
///
/// Read once at startup from `<config_dir>/weed-detector/config.json`. Every
/// field has a default, so a missing file or a partial one is fine.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::render::palette::ClassPalette;

/// Overrides `inference.endpoint` when set
pub const ENDPOINT_ENV: &str = "WEED_DETECTOR_ENDPOINT";

/// Hosted maize/weed model; append `?api_key=...` to use it
pub const DEFAULT_ENDPOINT: &str = "https://detect.roboflow.com/maize_weed_dataset-brv9k/1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Full endpoint URL, API key included
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl InferenceConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(self.endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {:?}", other))),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.endpoint_url()
            .map(|url| url.query_pairs().any(|(key, value)| key == "api_key" && !value.is_empty()))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub palette: ClassPalette,
    /// TTF/OTF file for box labels; system fonts are tried when unset
    pub label_font: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the user's config directory, then apply the environment override
    pub fn load() -> Result<Self, ConfigError> {
        let file = match Self::path() {
            Some(path) if path.exists() => {
                info!("⚙️  Loading config from {}", path.display());
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Some(text)
            }
            _ => None,
        };

        Self::from_sources(file.as_deref(), std::env::var(ENDPOINT_ENV).ok())
    }

    /// Build a config from the file contents (if any) and an endpoint override
    pub fn from_sources(file: Option<&str>, endpoint_override: Option<String>) -> Result<Self, ConfigError> {
        let mut config: AppConfig = match file {
            Some(text) => serde_json::from_str(text)?,
            None => AppConfig::default(),
        };

        if let Some(endpoint) = endpoint_override.filter(|e| !e.trim().is_empty()) {
            config.inference.endpoint = endpoint;
        }

        config.inference.endpoint_url()?;
        if !config.inference.has_api_key() {
            warn!("⚠️  Endpoint has no api_key; the hosted model will likely refuse requests");
        }

        Ok(config)
    }

    /// `<config_dir>/weed-detector/config.json`
    pub fn path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("weed-detector");
        path.push("config.json");
        Some(path)
    }
}
