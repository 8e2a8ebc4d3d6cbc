//! Error types for wordpress-content-audit

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WordPress audit operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid URL provided
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// Connection, DNS or timeout failure
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// HTTP response error status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// Response body was not the JSON we expected
    #[error("malformed response body: {0}")]
    Parse(String),

    /// Domain or filename is not a single path component
    #[error("invalid report key: '{0}'")]
    InvalidReportKey(String),

    /// Report store I/O failed
    #[error("report storage failed: {0}")]
    Storage(#[source] std::io::Error),

    /// HTTP server could not bind or serve
    #[error("server failed: {0}")]
    Server(#[source] std::io::Error),

    /// Invalid output format specified
    #[error("invalid output format: '{0}' (valid: human, json, none)")]
    InvalidOutputFormat(String),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    SerializationFailed(#[from] serde_json::Error),
}

impl Error {
    /// Map a reqwest error onto the transport kind
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
