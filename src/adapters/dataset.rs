//! Labeled held-out data for threshold calibration.
//!
//! CSV layout: one column per model feature (by name, any order, extra
//! columns ignored) plus a `label` column holding 0 or 1.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::Reader;

use crate::domain::{ConfigurationError, FeatureVector};

/// Column holding the ground-truth class.
pub const LABEL_COLUMN: &str = "label";

/// Encoded respondents with known outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<bool>,
}

fn invalid(msg: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidDataset(msg.into())
}

impl LabeledDataset {
    /// Load a dataset from a CSV file.
    ///
    /// # Errors
    /// Returns `InvalidDataset` if the file cannot be read or a row is malformed.
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        feature_names: &[String],
    ) -> Result<Self, ConfigurationError> {
        let file = File::open(&path)
            .map_err(|e| invalid(format!("{}: {e}", path.as_ref().display())))?;
        let dataset = Self::from_reader(file, feature_names)?;
        tracing::info!(
            "Loaded {} labeled rows from {:?} ({} positive)",
            dataset.len(),
            path.as_ref(),
            dataset.positives()
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader.
    ///
    /// # Errors
    /// Returns `InvalidDataset` on missing columns or non-numeric cells.
    pub fn from_reader<R: Read>(
        reader: R,
        feature_names: &[String],
    ) -> Result<Self, ConfigurationError> {
        let mut reader = Reader::from_reader(reader);

        let headers = reader.headers().map_err(|e| invalid(e.to_string()))?.clone();
        for required in feature_names.iter().map(String::as_str).chain([LABEL_COLUMN]) {
            if !headers.iter().any(|h| h == required) {
                return Err(invalid(format!("missing column '{required}'")));
            }
        }

        let mut dataset = Self::default();
        for (line, result) in reader.deserialize().enumerate() {
            let record: HashMap<String, String> =
                result.map_err(|e| invalid(format!("row {}: {e}", line + 1)))?;
            let cell = |name: &str| {
                record
                    .get(name)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| invalid(format!("row {}: bad value for '{name}'", line + 1)))
            };

            let label = match cell(LABEL_COLUMN)? {
                v if v == 0.0 => false,
                v if v == 1.0 => true,
                v => {
                    return Err(invalid(format!(
                        "row {}: label must be 0 or 1, got {v}",
                        line + 1
                    )))
                }
            };

            let values = feature_names
                .iter()
                .map(|name| cell(name))
                .collect::<Result<Vec<f64>, _>>()?;

            dataset.rows.push(FeatureVector::new(values));
            dataset.labels.push(label);
        }

        if dataset.is_empty() {
            return Err(invalid("no rows"));
        }
        Ok(dataset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of positive rows.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn names() -> Vec<String> {
        vec!["age".to_string(), "sleep_duration".to_string()]
    }

    #[test]
    fn test_parses_rows_in_feature_order() {
        let csv = "sleep_duration,label,age,extra\n1,0,30,x\n0,1,55,y\n";
        let dataset = LabeledDataset::from_reader(csv.as_bytes(), &names()).expect("Should parse");

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0].as_slice(), &[30.0, 1.0]);
        assert_eq!(dataset.rows[1].as_slice(), &[55.0, 0.0]);
        assert_eq!(dataset.labels, vec![false, true]);
        assert_eq!(dataset.positives(), 1);
    }

    #[test]
    fn test_missing_column() {
        let csv = "age,label\n30,0\n";
        let err = LabeledDataset::from_reader(csv.as_bytes(), &names()).expect_err("Should reject");
        assert!(err.to_string().contains("sleep_duration"));
    }

    #[test]
    fn test_rejects_non_binary_label() {
        let csv = "age,sleep_duration,label\n30,1,2\n";
        assert!(LabeledDataset::from_reader(csv.as_bytes(), &names()).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_cell() {
        let csv = "age,sleep_duration,label\nthirty,1,0\n";
        assert!(LabeledDataset::from_reader(csv.as_bytes(), &names()).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let csv = "age,sleep_duration,label\n";
        assert!(LabeledDataset::from_reader(csv.as_bytes(), &names()).is_err());
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempdir().expect("Should create temp dir");
        let path = dir.path().join("holdout.csv");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(b"age,sleep_duration,label\n40,1,1\n"))
            .expect("Should write csv");

        let dataset = LabeledDataset::from_csv_path(&path, &names()).expect("Should load");
        assert_eq!(dataset.len(), 1);

        assert!(LabeledDataset::from_csv_path(dir.path().join("missing.csv"), &names()).is_err());
    }
}
