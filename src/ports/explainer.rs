//! Explainer port: Trait for per-prediction feature attribution.

use crate::domain::{Explanation, FeatureVector};

use super::{Classifier, ModelError};

/// Trait for attribution engines.
///
/// The explainer treats the classifier as a black box; the application never
/// interprets attribution values beyond rendering them.
pub trait Explainer: Send + Sync {
    /// Attribute `classifier`'s output on `features` to individual features.
    ///
    /// # Arguments
    /// * `classifier` - Model whose prediction is explained
    /// * `features` - Respondent's encoded answers
    /// * `display_names` - One label per feature, in canonical order
    ///
    /// # Errors
    /// Returns `ModelError::Explanation` (or a classifier error) on failure.
    fn explain<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        features: &FeatureVector,
        display_names: &[String],
    ) -> Result<Explanation, ModelError>;
}
