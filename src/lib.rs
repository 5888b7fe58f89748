//! # Subhealth
//!
//! Lifestyle questionnaire screening for sub-health risk.
//!
//! This crate provides:
//! - A declarative questionnaire schema and a pure answer encoder
//! - Threshold-relative risk rescaling with optional amplification
//! - Boundary traits for a pretrained classifier and an attribution explainer
//! - Terminal UI for local, single-session use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Questionnaire schema, answers, encoding, scoring
//! - `ports`: Trait definitions for the classifier and explainer
//! - `adapters`: Concrete implementations (JSON model artifact, Shapley explainer, CSV data)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven startup configuration
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{
    validate_and_encode, AnswerSheet, ConfigurationError, FeatureVector, Questionnaire,
    RawAnswer, RiskTier, ScoreResult, ScoringConfig, ValidationError,
};

/// Result type for Subhealth operations
pub type Result<T> = std::result::Result<T, SubhealthError>;

/// Main error type for Subhealth
#[derive(Debug, thiserror::Error)]
pub enum SubhealthError {
    #[error("Invalid answers: {}", join_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Prediction or analysis failed: {0}")]
    Prediction(#[source] ports::ModelError),
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<ValidationError>> for SubhealthError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}
