//! Error types for the chord transcription engine

use std::fmt;

/// Errors that can occur during chord transcription
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Malformed chord dictionary or empty template bank
    InvalidTemplate(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (overflow, underflow, etc.)
    NumericalError(String),

    /// Result serialization error
    SerializationError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::InvalidTemplate(msg) => write!(f, "Invalid chord template: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            AnalysisError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::SerializationError(err.to_string())
    }
}
