//! Configuration errors shared by the domain layer.

/// Errors caused by a bad setup rather than by user answers.
///
/// These are fatal to the current request and must be surfaced verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Decision threshold {0} must lie strictly between 0 and 1")]
    InvalidThreshold(f64),

    #[error("Amplification exponent {0} must be a positive finite number")]
    InvalidExponent(f64),

    #[error("Classifier returned probability {0}, expected a value in [0, 1]")]
    InvalidProbability(f64),

    #[error("Expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Feature order mismatch at position {position}: expected {expected}, got {actual}")]
    FeatureOrderMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("Invalid questionnaire schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid threshold dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },
}
