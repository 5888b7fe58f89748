//! Domain layer: Core questionnaire and scoring logic.
//!
//! This module contains pure Rust types with no I/O.
//! Encoding and scoring are deterministic functions of their inputs.

mod answer;
mod encoder;
mod error;
mod explanation;
mod features;
mod questionnaire;
mod score;
pub mod threshold;

pub use answer::{AnswerSheet, RawAnswer};
pub use encoder::{encode, validate_and_encode, ValidationError};
pub use error::ConfigurationError;
pub use explanation::{Attribution, Explanation, WaterfallStep};
pub use features::FeatureVector;
pub use questionnaire::{
    ChoiceOption, QuestionKind, QuestionSpec, Questionnaire, NONE_OF_THE_ABOVE, SCHEMA_VERSION,
};
pub use score::{
    amplify, rescale, score, RiskTier, ScoreResult, ScoringConfig, ThresholdSource,
};
