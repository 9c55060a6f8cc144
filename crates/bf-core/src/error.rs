//! Error types for BeatForge

use thiserror::Error;

/// Core error type
///
/// Editing operations never fail; these variants come from the collaborators
/// that touch the outside world (map storage, preference files).
#[derive(Error, Debug)]
pub enum BfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid difficulty slot: {0}")]
    InvalidDifficulty(usize),
}

impl From<serde_json::Error> for BfError {
    fn from(err: serde_json::Error) -> Self {
        BfError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type BfResult<T> = Result<T, BfError>;
