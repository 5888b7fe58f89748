//! Decision threshold selection from a labelled hold-out set.
//!
//! The Youden index J = TPR - FPR is evaluated at every distinct score on
//! the ROC curve; the score maximizing J becomes the decision threshold.

use serde::{Deserialize, Serialize};

use super::ConfigurationError;

/// One operating point of the ROC curve.
///
/// A respondent is called positive when `score >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub tpr: f64,
    pub fpr: f64,
}

impl RocPoint {
    /// Youden's J statistic at this point.
    #[must_use]
    pub fn youden_index(&self) -> f64 {
        self.tpr - self.fpr
    }
}

fn check_inputs(scores: &[f64], labels: &[bool]) -> Result<(usize, usize), ConfigurationError> {
    let invalid = |msg: String| ConfigurationError::InvalidDataset(msg);

    if scores.len() != labels.len() {
        return Err(invalid(format!(
            "{} scores but {} labels",
            scores.len(),
            labels.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(invalid(format!("non-finite score {bad}")));
    }

    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(invalid(format!(
            "need both classes, got {n_pos} positive and {n_neg} negative rows"
        )));
    }
    Ok((n_pos, n_neg))
}

/// ROC operating points at every distinct score, highest threshold first.
///
/// # Errors
/// Returns `InvalidDataset` for mismatched lengths, non-finite scores or a
/// single-class label set.
pub fn roc_curve(scores: &[f64], labels: &[bool]) -> Result<Vec<RocPoint>, ConfigurationError> {
    let (n_pos, n_neg) = check_inputs(scores, labels)?;

    let mut pairs: Vec<(f64, bool)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < pairs.len() {
        let threshold = pairs[i].0;
        // Tied scores cross the threshold together.
        while i < pairs.len() && pairs[i].0 == threshold {
            if pairs[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            tpr: tp as f64 / n_pos as f64,
            fpr: fp as f64 / n_neg as f64,
        });
    }

    Ok(points)
}

/// Pick the threshold that maximizes TPR - FPR.
///
/// Ties keep the higher threshold.
///
/// # Errors
/// Returns `InvalidDataset` if the curve cannot be built, or
/// `InvalidThreshold` if the optimum is not strictly inside (0, 1).
pub fn youden_threshold(scores: &[f64], labels: &[bool]) -> Result<RocPoint, ConfigurationError> {
    let points = roc_curve(scores, labels)?;

    let mut best = points[0];
    for point in &points[1..] {
        if point.youden_index() > best.youden_index() {
            best = *point;
        }
    }

    if best.threshold > 0.0 && best.threshold < 1.0 {
        Ok(best)
    } else {
        Err(ConfigurationError::InvalidThreshold(best.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let scores = [0.1, 0.2, 0.3, 0.7, 0.8, 0.9];
        let labels = [false, false, false, true, true, true];
        let best = youden_threshold(&scores, &labels).expect("Should find threshold");
        assert!((best.threshold - 0.7).abs() < f64::EPSILON);
        assert!((best.youden_index() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlapping_classes() {
        // At 0.6: TPR = 2/3, FPR = 1/3 -> J = 1/3
        // At 0.4: TPR = 3/3, FPR = 1/3 -> J = 2/3 (best)
        let scores = [0.2, 0.4, 0.6, 0.7, 0.9, 0.3];
        let labels = [false, true, true, false, true, false];
        let best = youden_threshold(&scores, &labels).expect("Should find threshold");
        assert!((best.threshold - 0.4).abs() < f64::EPSILON);
        assert!((best.tpr - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ties_are_grouped() {
        let scores = [0.5, 0.5, 0.5, 0.1];
        let labels = [true, false, true, false];
        let curve = roc_curve(&scores, &labels).expect("Should build curve");
        assert_eq!(curve.len(), 2);
        assert!((curve[0].tpr - 1.0).abs() < f64::EPSILON);
        assert!((curve[0].fpr - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_equal_index_keeps_higher_threshold() {
        // 0.8 -> J = 1/2 - 0 = 0.5; 0.3 -> J = 1 - 1/2 = 0.5
        let scores = [0.8, 0.3, 0.3, 0.1];
        let labels = [true, true, false, false];
        let best = youden_threshold(&scores, &labels).expect("Should find threshold");
        assert!((best.threshold - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_class_rejected() {
        let err = youden_threshold(&[0.2, 0.4], &[true, true]).expect_err("Should reject");
        assert!(matches!(err, ConfigurationError::InvalidDataset(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(roc_curve(&[0.2, 0.4], &[true]).is_err());
    }

    #[test]
    fn test_degenerate_optimum_rejected() {
        // Best split sits at a score of exactly 1.0, which cannot be a threshold.
        let scores = [1.0, 1.0, 0.0, 0.0];
        let labels = [true, true, false, false];
        assert!(matches!(
            youden_threshold(&scores, &labels),
            Err(ConfigurationError::InvalidThreshold(_))
        ));
    }
}
