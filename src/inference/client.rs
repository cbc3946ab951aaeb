/// HTTP client for the hosted detection endpoint
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::response::parse_predictions;
use crate::config::InferenceConfig;
use crate::error::{ConfigError, DetectError, DetectResult};
use crate::state::data::DetectionSet;
use crate::state::preview::ImageUpload;

/// Multipart field the hosted model reads the image from
pub const UPLOAD_FIELD: &str = "file";

/// Client for the hosted detection endpoint.
///
/// One POST per call, no retries. The endpoint URL (API key included) is
/// treated as an opaque configuration value.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    endpoint: Url,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint_url()?;
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    /// Endpoint host, safe to log (the query may hold the API key)
    pub fn host(&self) -> &str {
        self.endpoint.host_str().unwrap_or("?")
    }

    /// Send the image and return its detections
    pub async fn detect(&self, upload: ImageUpload) -> DetectResult<DetectionSet> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| DetectError::InvalidInput(format!("Unsupported image type {}: {}", upload.mime, e)))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let started = Instant::now();
        debug!("POST {} ({} bytes)", self.endpoint.path(), upload.bytes.len());

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("❌ Request to {} failed: {}", self.host(), e);
                DetectError::Network(e.without_url().to_string())
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DetectError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            let detail = if text.is_empty() { status.to_string() } else { text };
            error!("❌ Server error {} from {}: {}", status.as_u16(), self.host(), detail);
            return Err(DetectError::Server { status: status.as_u16(), detail });
        }

        let detections = parse_predictions(&body)?;
        info!(
            "📦 {} predictions from {} in {} ms",
            detections.len(),
            self.host(),
            started.elapsed().as_millis()
        );
        Ok(detections)
    }
}
