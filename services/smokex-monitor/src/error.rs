//! Error types for the Smoke X monitor

/// Errors that can occur in the Smoke X monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Device returned status {status}: {body}")]
    Device { status: u16, body: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
