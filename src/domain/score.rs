//! Risk scoring: threshold-relative rescaling, amplification and tiers.
//!
//! The classifier's decision threshold is relocated to the 50% mark of the
//! displayed scale. The optional amplification stretches values away from
//! that mark; the result is a display percentage, not a calibrated
//! probability.

use serde::{Deserialize, Serialize};

use super::ConfigurationError;

/// Risk tier shown to the respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Lower bound of the medium tier.
    pub const MEDIUM_CUTOFF: f64 = 0.5;
    /// Lower bound of the high tier.
    pub const HIGH_CUTOFF: f64 = 0.6;

    /// Bucket a final (rescaled) probability.
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p < Self::MEDIUM_CUTOFF {
            Self::Low
        } else if p < Self::HIGH_CUTOFF {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Short label in the questionnaire's language.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "低风险",
            Self::Medium => "中风险",
            Self::High => "高风险",
        }
    }

    /// Fixed advisory message for the tier.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "根据我们的模型，您的亚健康风险较低，健康状况良好！继续保持健康的生活习惯，定期关注自身健康状况，预防胜于治疗！",
            Self::Medium => "根据我们的模型，您的亚健康风险处于中等水平，可能存在一些健康隐患。建议您更加关注健康风险，适当调整生活习惯，避免过度疲劳和压力。定期进行健康检查，及时了解身体状况，必要时可咨询健康专家获取建议。",
            Self::High => "根据我们的模型，您的亚健康风险较高。请高度重视您的健康状况，及时调整生活方式，避免不良习惯。建议尽快咨询医疗保健提供者，进行进一步评估和干预，确保健康风险得到有效控制。",
        }
    }

    /// Associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),    // Emerald
            Self::Medium => (251, 191, 36), // Amber
            Self::High => (244, 63, 94),    // Rose
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Where the decision threshold came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// Operator-supplied constant
    Fixed,
    /// Youden-index optimum on a held-out labelled set
    Youden,
}

/// Immutable scoring configuration, built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    threshold: f64,
    source: ThresholdSource,
    amplification: Option<f64>,
}

impl ScoringConfig {
    /// Threshold used when none is configured.
    pub const DEFAULT_THRESHOLD: f64 = 0.95;

    /// Amplification exponent of the amplified scoring variant.
    pub const DEFAULT_AMPLIFICATION: f64 = 2.5;

    /// Scoring with a fixed threshold and no amplification.
    ///
    /// # Errors
    /// Returns `InvalidThreshold` unless `0 < threshold < 1`.
    pub fn fixed(threshold: f64) -> Result<Self, ConfigurationError> {
        Self::with_source(threshold, ThresholdSource::Fixed)
    }

    /// Scoring with a threshold derived by the Youden index.
    ///
    /// # Errors
    /// Returns `InvalidThreshold` unless `0 < threshold < 1`.
    pub fn youden(threshold: f64) -> Result<Self, ConfigurationError> {
        Self::with_source(threshold, ThresholdSource::Youden)
    }

    fn with_source(threshold: f64, source: ThresholdSource) -> Result<Self, ConfigurationError> {
        check_threshold(threshold)?;
        Ok(Self {
            threshold,
            source,
            amplification: None,
        })
    }

    /// Enable power-law amplification.
    ///
    /// # Errors
    /// Returns `InvalidExponent` unless the exponent is finite and positive.
    pub fn with_amplification(mut self, exponent: f64) -> Result<Self, ConfigurationError> {
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(ConfigurationError::InvalidExponent(exponent));
        }
        self.amplification = Some(exponent);
        Ok(self)
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn source(&self) -> ThresholdSource {
        self.source
    }

    #[must_use]
    pub fn amplification(&self) -> Option<f64> {
        self.amplification
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            source: ThresholdSource::Fixed,
            amplification: None,
        }
    }
}

/// Outcome of scoring one respondent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Positive-class probability from the classifier
    pub raw_probability: f64,

    /// Threshold-relative value, before amplification
    pub relative_probability: f64,

    /// Final displayed value (amplified when enabled)
    pub rescaled_probability: f64,

    pub risk_tier: RiskTier,

    /// Threshold the raw probability was compared against
    pub threshold: f64,
}

impl ScoreResult {
    /// Final value as a percentage in [0, 100].
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.rescaled_probability * 100.0
    }

    /// Whether the classifier itself calls the respondent positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.raw_probability >= self.threshold
    }
}

fn check_threshold(threshold: f64) -> Result<(), ConfigurationError> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidThreshold(threshold))
    }
}

/// Map `[0, t)` to `[0, 0.5)` and `[t, 1]` to `[0.5, 1]`.
///
/// # Errors
/// Returns `InvalidThreshold` unless `0 < threshold < 1`.
pub fn rescale(raw_probability: f64, threshold: f64) -> Result<f64, ConfigurationError> {
    check_threshold(threshold)?;

    let rescaled = if raw_probability < threshold {
        (raw_probability / threshold) * 0.5
    } else {
        0.5 + ((raw_probability - threshold) / (1.0 - threshold)) * 0.5
    };
    Ok(rescaled)
}

/// Power-law stretch, symmetric about 0.5. Fixes 0, 0.5 and 1.
#[must_use]
pub fn amplify(rescaled: f64, exponent: f64) -> f64 {
    if rescaled < 0.5 {
        0.5 * (rescaled / 0.5).powf(exponent)
    } else {
        0.5 + 0.5 * ((rescaled - 0.5) / 0.5).powf(exponent)
    }
}

/// Score a raw classifier probability.
///
/// # Errors
/// Returns `InvalidProbability` for values outside `[0, 1]` (or NaN) and
/// `InvalidThreshold` for a bad threshold.
pub fn score(
    raw_probability: f64,
    config: &ScoringConfig,
) -> Result<ScoreResult, ConfigurationError> {
    if !(0.0..=1.0).contains(&raw_probability) {
        return Err(ConfigurationError::InvalidProbability(raw_probability));
    }

    let relative = rescale(raw_probability, config.threshold)?;
    let rescaled = match config.amplification {
        Some(exponent) => amplify(relative, exponent),
        None => relative,
    };

    Ok(ScoreResult {
        raw_probability,
        relative_probability: relative,
        rescaled_probability: rescaled,
        risk_tier: RiskTier::from_probability(rescaled),
        threshold: config.threshold,
    })
}
