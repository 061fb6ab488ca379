use thiserror::Error;

use crate::ValidationError;

/// Failures of the conversation log itself.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Message index {index} out of range (log holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
