//! Model artifact adapter: a pretrained classifier loaded from JSON.
//!
//! The training pipeline exports one of two model families:
//! - `logistic`: standardized linear model with a sigmoid link
//! - `tree_ensemble`: gradient-boosted binary trees summed in logit space
//!
//! # Integrity
//!
//! The artifact may be pinned by SHA-256. When a digest is configured the
//! file bytes must match before anything is parsed.
//!
//! # Layout
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["age", "household_registration", "..."],
//!   "baseline": [35.0, 1.0, "..."],
//!   "model": { "kind": "tree_ensemble", "base_score": 2.5, "trees": [] }
//! }
//! ```

mod tree;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::FeatureVector;
use crate::ports::{Classifier, ModelError};

pub use tree::{Tree, TreeEnsemble, TreeNode};

/// File name looked up when the model path is a directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// Supported artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Standardized logistic regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_std: Option<Vec<f64>>,
}

impl LogisticModel {
    fn validate(&self, n: usize) -> Result<(), ModelError> {
        if self.coefficients.len() != n {
            return Err(ModelError::InvalidArtifact(format!(
                "logistic model has {} coefficients for {n} features",
                self.coefficients.len()
            )));
        }
        for (name, params) in [
            ("scaler_mean", &self.scaler_mean),
            ("scaler_std", &self.scaler_std),
        ] {
            if let Some(values) = params {
                if values.len() != n {
                    return Err(ModelError::InvalidArtifact(format!(
                        "{name} has {} entries for {n} features",
                        values.len()
                    )));
                }
            }
        }
        if let Some(std) = &self.scaler_std {
            if std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(ModelError::InvalidArtifact(
                    "scaler_std entries must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    fn logit(&self, x: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (&xi, &coef)) in x.iter().zip(&self.coefficients).enumerate() {
            let mean = self.scaler_mean.as_ref().map_or(0.0, |m| m[i]);
            let std = self.scaler_std.as_ref().map_or(1.0, |s| s[i]);
            z += coef * (xi - mean) / std;
        }
        z
    }
}

/// Model family, tagged by `kind` in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

/// On-disk artifact layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    /// Reference respondent for attributions (defaults to all zeros)
    #[serde(default)]
    pub baseline: Option<Vec<f64>>,
    pub model: ModelArtifact,
}

/// A validated, immutable classifier.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    feature_names: Vec<String>,
    baseline: Vec<f64>,
    model: ModelArtifact,
    sha256: String,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Resolve a model path: directories contain `model.json`.
#[must_use]
pub fn resolve_model_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

impl LoadedModel {
    /// Load and validate a model artifact.
    ///
    /// # Arguments
    /// * `path` - Artifact file, or a directory containing `model.json`
    /// * `pinned_sha256` - Expected hex digest of the file, if pinned
    ///
    /// # Errors
    /// Returns `Unavailable` if the file cannot be read, `Integrity` on a
    /// digest mismatch, and `InvalidArtifact` if the content is malformed.
    pub fn load(path: &Path, pinned_sha256: Option<&str>) -> Result<Self, ModelError> {
        let model_path = resolve_model_path(path);
        let bytes = std::fs::read(&model_path)
            .map_err(|e| ModelError::Unavailable(format!("{}: {e}", model_path.display())))?;

        let digest = sha256_hex(&bytes);
        if let Some(expected) = pinned_sha256 {
            if !digest.eq_ignore_ascii_case(expected.trim()) {
                tracing::error!("Model digest mismatch for {:?}", model_path);
                return Err(ModelError::Integrity(format!(
                    "{} does not match the pinned SHA-256 digest",
                    model_path.display()
                )));
            }
        } else {
            tracing::warn!("Model digest not pinned; loading {:?} unverified", model_path);
        }

        let model = Self::from_slice(&bytes)?;
        tracing::info!(
            "Loaded model from {:?} (kind={}, n_features={}, sha256={})",
            model_path,
            model.kind(),
            model.feature_names.len(),
            &model.sha256[..12]
        );
        Ok(model)
    }

    /// Parse and validate an artifact from memory.
    ///
    /// # Errors
    /// Returns `InvalidArtifact` if the content is malformed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        let sha256 = sha256_hex(bytes);
        Self::from_file(file, sha256)
    }

    fn from_file(file: ModelFile, sha256: String) -> Result<Self, ModelError> {
        if file.format_version != FORMAT_VERSION {
            return Err(ModelError::InvalidArtifact(format!(
                "unsupported format_version {}",
                file.format_version
            )));
        }

        let n = file.feature_names.len();
        if n == 0 {
            return Err(ModelError::InvalidArtifact("no feature names".into()));
        }

        match &file.model {
            ModelArtifact::Logistic(m) => m.validate(n)?,
            ModelArtifact::TreeEnsemble(m) => m.validate(n)?,
        }

        let baseline = match file.baseline {
            Some(b) if b.len() != n => {
                return Err(ModelError::InvalidArtifact(format!(
                    "baseline has {} entries for {n} features",
                    b.len()
                )));
            }
            Some(b) => b,
            None => vec![0.0; n],
        };

        Ok(Self {
            feature_names: file.feature_names,
            baseline,
            model: file.model,
            sha256,
        })
    }

    /// Reference respondent used as the attribution baseline.
    #[must_use]
    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    /// Hex SHA-256 digest of the artifact bytes.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Model family name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.model {
            ModelArtifact::Logistic(_) => "logistic",
            ModelArtifact::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

impl Classifier for LoadedModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if features.len() != self.feature_names.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.feature_names.len(),
                actual: features.len(),
            });
        }

        let x = features.as_slice();
        let logit = match &self.model {
            ModelArtifact::Logistic(m) => m.logit(x),
            ModelArtifact::TreeEnsemble(m) => m.logit(x),
        };

        let p = sigmoid(logit);
        if p.is_nan() {
            return Err(ModelError::Prediction(format!("model produced logit {logit}")));
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn logistic_json() -> String {
        r#"{
            "format_version": 1,
            "feature_names": ["a", "b"],
            "model": {
                "kind": "logistic",
                "coefficients": [1.0, -2.0],
                "intercept": 0.5,
                "scaler_mean": [1.0, 0.0],
                "scaler_std": [2.0, 1.0]
            }
        }"#
        .to_string()
    }

    #[test]
    fn test_logistic_prediction() {
        let model = LoadedModel::from_slice(logistic_json().as_bytes()).expect("Should parse");
        assert_eq!(model.kind(), "logistic");
        assert_eq!(model.baseline(), &[0.0, 0.0]);

        // z = 0.5 + 1.0 * (3 - 1) / 2 - 2.0 * 0.25 = 1.0
        let p = model
            .predict_proba(&FeatureVector::new(vec![3.0, 0.25]))
            .expect("Should predict");
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let model = LoadedModel::from_slice(logistic_json().as_bytes()).expect("Should parse");
        let err = model
            .predict_proba(&FeatureVector::new(vec![1.0]))
            .expect_err("Should reject");
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_rejects_bad_coefficients() {
        let json = logistic_json().replace("[1.0, -2.0]", "[1.0]");
        assert!(matches!(
            LoadedModel::from_slice(json.as_bytes()),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = logistic_json().replace("\"format_version\": 1", "\"format_version\": 7");
        assert!(LoadedModel::from_slice(json.as_bytes()).is_err());
    }

    #[test]
    fn test_load_with_pinned_digest() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join(MODEL_FILE_NAME);
        let json = logistic_json();
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(json.as_bytes()))
            .expect("Should write model");

        let digest = sha256_hex(json.as_bytes());
        let model = LoadedModel::load(dir.path(), Some(&digest.to_uppercase()))
            .expect("Directory path with matching digest should load");
        assert_eq!(model.sha256(), digest);

        let err = LoadedModel::load(&path, Some("00ff")).expect_err("Digest mismatch");
        assert!(matches!(err, ModelError::Integrity(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LoadedModel::load(Path::new("does/not/exist.json"), None).expect_err("Missing");
        assert!(matches!(err, ModelError::Unavailable(_)));
    }

    #[test]
    fn test_bundled_model_matches_questionnaire() {
        let model =
            LoadedModel::load(Path::new("models"), None).expect("Bundled model should load");
        let questionnaire = crate::domain::Questionnaire::lifestyle_v1();
        questionnaire
            .check_feature_order(model.feature_names())
            .expect("Bundled model should follow canonical order");

        let p = model
            .predict_proba(&FeatureVector::new(vec![
                30.0, 1.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0,
            ]))
            .expect("Should predict");
        assert!((0.0..=1.0).contains(&p));
    }
}
