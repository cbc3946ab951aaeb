/// Error types shared by ingestion, inference and configuration
use thiserror::Error;

/// Message shown in the banner for every failure that is not the user's input
pub const GENERIC_FAILURE: &str = "Prediction failed. Check the log and the endpoint URL/key.";

/// Everything that can go wrong between picking a file and getting boxes back.
///
/// Variants carry strings instead of source errors so the error can travel
/// inside iced messages, which must be `Clone`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl DetectError {
    /// Text for the error banner
    pub fn user_message(&self) -> String {
        match self {
            DetectError::InvalidInput(message) => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

pub type DetectResult<T> = Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Client(String),
}
