//! Model-ready feature vectors.

use serde::{Deserialize, Serialize};

use super::ConfigurationError;

/// Encoded answers in canonical questionnaire order.
///
/// The order must match the order the classifier was trained on; the
/// length always equals the number of questions that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap already-ordered values.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// # Errors
    /// Returns `FeatureCountMismatch` if the length differs from `expected`.
    pub fn check_len(&self, expected: usize) -> Result<(), ConfigurationError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(ConfigurationError::FeatureCountMismatch {
                expected,
                actual: self.values.len(),
            })
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        let v = FeatureVector::new(vec![30.0, 1.0, 0.0]);
        v.check_len(3).expect("Should accept");
        assert_eq!(v.len(), 3);
        assert_eq!(v.get(0), Some(30.0));

        let err = FeatureVector::new(vec![1.0; 9])
            .check_len(10)
            .expect_err("Should reject");
        assert_eq!(
            err,
            ConfigurationError::FeatureCountMismatch {
                expected: 10,
                actual: 9
            }
        );
    }
}
