//! Shapley-value explainer for black-box classifiers.
//!
//! Features missing from a coalition take their baseline value. For small
//! feature counts every coalition is evaluated and the Shapley values are
//! exact; beyond that, contributions are estimated from random feature
//! permutations drawn from a seeded ChaCha stream, so repeated runs agree.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::{Attribution, Explanation, FeatureVector};
use crate::ports::{Classifier, Explainer, ModelError};

/// Largest feature count explained by full coalition enumeration.
const EXACT_MAX_FEATURES: usize = 12;

/// Default number of permutations in sampling mode.
const DEFAULT_PERMUTATIONS: usize = 256;

const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Model-agnostic Shapley explainer relative to a fixed baseline.
#[derive(Debug, Clone)]
pub struct ShapleyExplainer {
    baseline: Vec<f64>,
    permutations: usize,
    seed: u64,
}

impl ShapleyExplainer {
    /// Create an explainer with the given baseline respondent.
    #[must_use]
    pub fn new(baseline: Vec<f64>) -> Self {
        Self {
            baseline,
            permutations: DEFAULT_PERMUTATIONS,
            seed: DEFAULT_SEED,
        }
    }

    /// Configure sampling mode (used only above the exact-mode limit).
    #[must_use]
    pub fn with_sampling(mut self, permutations: usize, seed: u64) -> Self {
        self.permutations = permutations.max(1);
        self.seed = seed;
        self
    }

    fn hybrid(&self, x: &[f64], mask: impl Fn(usize) -> bool) -> FeatureVector {
        FeatureVector::new(
            x.iter()
                .zip(&self.baseline)
                .enumerate()
                .map(|(i, (&xi, &bi))| if mask(i) { xi } else { bi })
                .collect(),
        )
    }

    fn exact<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        x: &[f64],
    ) -> Result<Vec<f64>, ModelError> {
        let n = x.len();
        let coalitions = 1usize << n;

        let mut values = Vec::with_capacity(coalitions);
        for mask in 0..coalitions {
            values.push(classifier.predict_proba(&self.hybrid(x, |i| mask & (1 << i) != 0))?);
        }

        // weight[s] = s! (n - s - 1)! / n!
        let mut factorial = vec![1.0f64; n + 1];
        for k in 1..=n {
            factorial[k] = factorial[k - 1] * k as f64;
        }
        let weight: Vec<f64> = (0..n)
            .map(|s| factorial[s] * factorial[n - s - 1] / factorial[n])
            .collect();

        let mut phi = vec![0.0; n];
        for (i, phi_i) in phi.iter_mut().enumerate() {
            let bit = 1usize << i;
            for mask in (0..coalitions).filter(|m| m & bit == 0) {
                let s = mask.count_ones() as usize;
                *phi_i += weight[s] * (values[mask | bit] - values[mask]);
            }
        }
        Ok(phi)
    }

    fn sampled<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        x: &[f64],
    ) -> Result<Vec<f64>, ModelError> {
        let n = x.len();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n).collect();
        let mut phi = vec![0.0; n];

        for _ in 0..self.permutations {
            order.shuffle(&mut rng);
            let mut present = vec![false; n];
            let mut previous = classifier.predict_proba(&self.hybrid(x, |i| present[i]))?;
            for &feature in &order {
                present[feature] = true;
                let current = classifier.predict_proba(&self.hybrid(x, |i| present[i]))?;
                phi[feature] += current - previous;
                previous = current;
            }
        }

        let count = self.permutations as f64;
        Ok(phi.into_iter().map(|p| p / count).collect())
    }
}

impl Explainer for ShapleyExplainer {
    fn explain<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        features: &FeatureVector,
        display_names: &[String],
    ) -> Result<Explanation, ModelError> {
        let n = features.len();
        if self.baseline.len() != n {
            return Err(ModelError::ShapeMismatch {
                expected: self.baseline.len(),
                actual: n,
            });
        }
        if display_names.len() != n {
            return Err(ModelError::Explanation(format!(
                "{} display names for {n} features",
                display_names.len()
            )));
        }

        let x = features.as_slice();
        let base_value = classifier.predict_proba(&FeatureVector::new(self.baseline.clone()))?;
        let phi = if n <= EXACT_MAX_FEATURES {
            self.exact(classifier, x)?
        } else {
            tracing::debug!("Sampling {} permutations for {n} features", self.permutations);
            self.sampled(classifier, x)?
        };

        let attributions = display_names
            .iter()
            .zip(x)
            .zip(phi)
            .map(|((name, &value), contribution)| Attribution {
                feature: name.clone(),
                value,
                contribution,
            })
            .collect();

        Ok(Explanation {
            base_value,
            attributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// p = clamp(0.1 + 0.2 * x0 - 0.1 * x1 + 0.05 * x0 * x2)
    struct Interacting {
        names: Vec<String>,
    }

    impl Classifier for Interacting {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
            let x = features.as_slice();
            Ok(0.1 + 0.2 * x[0] - 0.1 * x[1] + 0.05 * x[0] * x[2])
        }
    }

    /// Additive in every feature: p = 0.01 * sum(x)
    struct Additive {
        names: Vec<String>,
    }

    impl Classifier for Additive {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(0.01 * features.as_slice().iter().sum::<f64>())
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_exact_efficiency_and_symmetry() {
        let model = Interacting { names: names(3) };
        let explainer = ShapleyExplainer::new(vec![0.0, 0.0, 0.0]);
        let x = FeatureVector::new(vec![1.0, 1.0, 1.0]);

        let e = explainer.explain(&model, &x, &names(3)).expect("Should explain");
        let fx = model.predict_proba(&x).expect("Should predict");

        assert!((e.base_value - 0.1).abs() < 1e-12);
        assert!((e.output() - fx).abs() < 1e-12);
        // The interaction term is split evenly between x0 and x2.
        assert!((e.attributions[0].contribution - 0.225).abs() < 1e-12);
        assert!((e.attributions[1].contribution + 0.1).abs() < 1e-12);
        assert!((e.attributions[2].contribution - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_mode_is_exact_for_additive_models() {
        let n = EXACT_MAX_FEATURES + 2;
        let model = Additive { names: names(n) };
        let explainer = ShapleyExplainer::new(vec![0.0; n]).with_sampling(8, 7);
        let x = FeatureVector::new((0..n).map(|i| i as f64).collect());

        let e = explainer.explain(&model, &x, &names(n)).expect("Should explain");
        for (i, a) in e.attributions.iter().enumerate() {
            assert!((a.contribution - 0.01 * i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let n = EXACT_MAX_FEATURES + 1;
        let model = Additive { names: names(n) };
        let explainer = ShapleyExplainer::new(vec![1.0; n]).with_sampling(4, 42);
        let x = FeatureVector::new(vec![2.0; n]);

        let a = explainer.explain(&model, &x, &names(n)).expect("first");
        let b = explainer.explain(&model, &x, &names(n)).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn test_baseline_length_mismatch() {
        let model = Additive { names: names(2) };
        let explainer = ShapleyExplainer::new(vec![0.0; 3]);
        let err = explainer
            .explain(&model, &FeatureVector::new(vec![1.0, 2.0]), &names(2))
            .expect_err("Should reject");
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }
}
