//! Calibration: Turns startup configuration into a `ScoringConfig`.
//!
//! A fixed threshold is used as given. A Youden threshold is derived by
//! scoring every held-out row with the loaded classifier.

use crate::adapters::LabeledDataset;
use crate::config::{AppConfig, ThresholdSetting};
use crate::domain::threshold::{youden_threshold, RocPoint};
use crate::domain::ScoringConfig;
use crate::ports::Classifier;
use crate::SubhealthError;

/// Youden-optimal operating point of `classifier` on `dataset`.
///
/// # Errors
/// Returns `Prediction` if the classifier fails on a row, and
/// `Configuration` if the dataset is unusable or the optimum is degenerate.
pub fn youden_point<C: Classifier + ?Sized>(
    classifier: &C,
    dataset: &LabeledDataset,
) -> Result<RocPoint, SubhealthError> {
    let scores = dataset
        .rows
        .iter()
        .map(|row| classifier.predict_proba(row))
        .collect::<Result<Vec<f64>, _>>()
        .map_err(SubhealthError::Prediction)?;

    let point = youden_threshold(&scores, &dataset.labels)?;
    tracing::info!(
        "Youden threshold {:.4} (TPR={:.3}, FPR={:.3}, J={:.3}) over {} rows",
        point.threshold,
        point.tpr,
        point.fpr,
        point.youden_index(),
        dataset.len()
    );
    Ok(point)
}

/// Build the scoring configuration described by `config`.
///
/// # Errors
/// Returns `Configuration` for an invalid threshold, exponent or dataset,
/// and `Prediction` if the classifier fails while calibrating.
pub fn scoring_config<C: Classifier + ?Sized>(
    config: &AppConfig,
    classifier: &C,
) -> Result<ScoringConfig, SubhealthError> {
    let scoring = match &config.threshold {
        ThresholdSetting::Fixed(threshold) => ScoringConfig::fixed(*threshold)?,
        ThresholdSetting::Youden { dataset } => {
            let dataset = LabeledDataset::from_csv_path(dataset, classifier.feature_names())?;
            ScoringConfig::youden(youden_point(classifier, &dataset)?.threshold)?
        }
    };

    Ok(match config.amplification {
        Some(exponent) => scoring.with_amplification(exponent)?,
        None => scoring,
    })
}
