//! Domain-specific error types for forecast-synth

use thiserror::Error;

use crate::clients::ModelError;

/// Main error type for the forecast synthesis engine
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Normalization error: {message}")]
    Normalization { message: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Shape mismatch: expected options {expected:?}, got {actual:?}")]
    LabelMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Invalid question: {message}")]
    InvalidQuestion { message: String },

    #[error("No runs to aggregate")]
    NoRuns,

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ForecastError {
    pub fn extraction(message: impl Into<String>) -> Self {
        ForecastError::Extraction {
            message: message.into(),
        }
    }

    pub fn normalization(message: impl Into<String>) -> Self {
        ForecastError::Normalization {
            message: message.into(),
        }
    }

    pub fn invalid_question(message: impl Into<String>) -> Self {
        ForecastError::InvalidQuestion {
            message: message.into(),
        }
    }

    /// Stable error class name reported in run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::Extraction { .. } => "ExtractionError",
            ForecastError::Normalization { .. } => "NormalizationError",
            ForecastError::ShapeMismatch { .. } | ForecastError::LabelMismatch { .. } => {
                "ShapeMismatchError"
            }
            ForecastError::InvalidQuestion { .. } => "InvalidQuestionError",
            ForecastError::NoRuns => "NoRunsError",
            ForecastError::Model(_) => "ModelError",
            ForecastError::Config { .. } => "ConfigError",
            ForecastError::Serialization { .. } => "SerializationError",
            ForecastError::Internal { .. } => "InternalError",
        }
    }
}

impl From<anyhow::Error> for ForecastError {
    fn from(err: anyhow::Error) -> Self {
        ForecastError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ForecastError::extraction("x").kind(), "ExtractionError");
        assert_eq!(ForecastError::normalization("x").kind(), "NormalizationError");
        assert_eq!(
            ForecastError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
            .kind(),
            "ShapeMismatchError"
        );
        assert_eq!(
            ForecastError::Model(ModelError::EmptyResponse).kind(),
            "ModelError"
        );
    }

    #[test]
    fn shape_mismatch_message_names_both_sides() {
        let err = ForecastError::ShapeMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Shape mismatch: expected 4, got 3");
    }
}
