use thiserror::Error;

/// Application-level error type.
///
/// `MissingRegion` is deliberately not a variant: an anchor that cannot be
/// found during extraction is recorded as an absent region, never an error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to decode adaptation response: {0}")]
    Decode(String),

    #[error("Structural validation failed: {0}")]
    Structural(String),

    #[error("Generation call failed: {0}")]
    ExternalCall(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}
