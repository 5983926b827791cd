use thiserror::Error;

/// Result type for digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Errors that can occur while producing a digest
#[derive(Error, Debug)]
pub enum DigestError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// File content is not valid UTF-8
    #[error("File is not valid UTF-8: {0}")]
    NotUtf8(String),
}

impl DigestError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
