use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalkError>;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid repository root: {0}")]
    InvalidRoot(String),

    #[error("Invalid walk options: {0}")]
    InvalidOptions(String),
}
