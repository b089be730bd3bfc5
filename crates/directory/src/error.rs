use thiserror::Error;

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors surfaced by the directory library
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON payload could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from a remote source
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Embedded seed data is malformed
    #[error("Seed data error: {0}")]
    Seed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DirectoryError {
    /// Create an invalid config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
