use thiserror::Error;

/// How a unit of work can end other than with a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The run observed its cancellation signal
    #[error("cancelled by user")]
    Cancelled,

    /// The run failed; the message is surfaced on the next status call
    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
