use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObbError>;

/// Failure taxonomy for the archive pipeline. Every component classifies its
/// own failures at its boundary; none of them retries internally.
#[derive(Error, Debug)]
pub enum ObbError {
    #[error("Source archive not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO Error in context '{0}': {1}")]
    IoContext(String, #[source] std::io::Error),

    #[error("Copy Failed: {0}")]
    Copy(String),

    #[error("Extract Failed: {0}")]
    Extract(String),

    #[error("Recompress Failed: {0}")]
    Recompress(String),

    #[error("Swap Failed: {0}")]
    Swap(String),

    #[error("Unexpected Error: {0}")]
    Unexpected(String),
}
