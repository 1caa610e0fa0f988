// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Automatic Display/Error trait implementations
// - Source error chaining

use thiserror::Error;

/// Classifier adapter errors
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("ONNX inference failed: {0}")]
    InferenceFailed(#[from] ort::Error),

    #[error("model produced {got} outputs, expected {expected}")]
    UnexpectedOutputShape { got: usize, expected: usize },

    #[error("model file not found at {0}")]
    ModelFileMissing(String),
}

/// Errors raised while turning one image into an analysis result.
///
/// Mapping to HTTP status codes happens at the handler layer; only
/// `InputMissing` is user-correctable (400), everything else is a 500.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no image data provided")]
    InputMissing,

    #[error("AI model not available")]
    ModelUnavailable,

    #[error("invalid base64 image payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    #[error("image decoding failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),
}

impl AnalysisError {
    /// Stable, machine-readable error category exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InputMissing => "input_missing",
            AnalysisError::ModelUnavailable => "model_unavailable",
            AnalysisError::InvalidPayload(_) | AnalysisError::Decode(_) => "decode_error",
            AnalysisError::Classify(_) => "classification_error",
        }
    }
}

/// History store errors
///
/// Only surfaced on reads. Append failures are logged and swallowed by
/// `HistoryStore::append_best_effort` because the analysis result has
/// already been delivered to the caller by the time persistence runs.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("failed to serialize analysis result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session pool size must be > 0, got {0}")]
    InvalidPoolSize(usize),

    #[error("model path must not be empty")]
    EmptyModelPath,

    #[error("invalid database path: {0}")]
    InvalidDatabasePath(String),
}

// Convenience type aliases for Results
pub type ClassifyResult<T> = Result<T, ClassifyError>;
pub type AnalysisResultOf<T> = Result<T, AnalysisError>;
pub type HistoryResult<T> = Result<T, HistoryError>;
