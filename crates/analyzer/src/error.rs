use crate::fetch::FetchError;
use repolens_code_digest::DigestError;
use repolens_operations::OperationError;
use repolens_tree_walker::WalkError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Missing or malformed input; no task is started
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Repository fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<WalkError> for AnalysisError {
    fn from(err: WalkError) -> Self {
        Self::Internal(format!("scan failed: {err}"))
    }
}

impl From<DigestError> for AnalysisError {
    fn from(err: DigestError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<OperationError> for AnalysisError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Cancelled => Self::Cancelled,
            OperationError::Failed(message) => Self::Internal(message),
        }
    }
}

impl From<AnalysisError> for OperationError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Cancelled => OperationError::Cancelled,
            other => OperationError::Failed(other.to_string()),
        }
    }
}
