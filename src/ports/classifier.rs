//! Classifier port: Trait for a pretrained binary classifier.
//!
//! This trait abstracts the serialized model from the application logic.

use crate::domain::FeatureVector;

/// Errors raised by model collaborators (classifier or explainer).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),

    #[error("Expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Explanation failed: {0}")]
    Explanation(String),
}

/// Trait for binary classifiers.
///
/// Implementations are loaded once and treated as read-only afterwards, so
/// they can be shared by reference across requests.
pub trait Classifier: Send + Sync {
    /// Feature names in the order the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Number of features the model expects.
    fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    /// Probability of the positive class.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the vector length is wrong, or
    /// `ModelError::Prediction` if the model cannot produce a probability.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}
