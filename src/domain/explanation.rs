//! Feature attribution results, as produced by an explainer.

use serde::{Deserialize, Serialize};

/// Contribution of one feature to a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Display name of the feature
    pub feature: String,
    /// Encoded feature value of the respondent
    pub value: f64,
    /// Signed contribution in probability units
    pub contribution: f64,
}

/// Per-feature attributions plus the expected model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub base_value: f64,
    pub attributions: Vec<Attribution>,
}

/// One bar of a waterfall chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallStep<'a> {
    pub attribution: &'a Attribution,
    /// Running total before this bar
    pub start: f64,
    /// Running total after this bar
    pub end: f64,
}

impl Explanation {
    /// Model output reconstructed from the attributions.
    #[must_use]
    pub fn output(&self) -> f64 {
        self.base_value + self.attributions.iter().map(|a| a.contribution).sum::<f64>()
    }

    /// Attributions sorted by absolute contribution, largest first.
    #[must_use]
    pub fn ranked(&self) -> Vec<&Attribution> {
        let mut ranked: Vec<&Attribution> = self.attributions.iter().collect();
        ranked.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        ranked
    }

    /// Waterfall bars, largest first.
    ///
    /// Running totals accumulate from the base value upward through the
    /// smallest contributions, so the largest bar ends at `output()`.
    #[must_use]
    pub fn waterfall(&self) -> Vec<WaterfallStep<'_>> {
        let ranked = self.ranked();
        let mut steps = Vec::with_capacity(ranked.len());
        let mut running = self.base_value;
        for attribution in ranked.into_iter().rev() {
            let start = running;
            running += attribution.contribution;
            steps.push(WaterfallStep {
                attribution,
                start,
                end: running,
            });
        }
        steps.reverse();
        steps
    }
}
