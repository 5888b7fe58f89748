//! Startup configuration read from `SUBHEALTH_*` environment variables.
//!
//! Parsed once into an immutable [`AppConfig`]. Malformed values are
//! reported as errors rather than replaced by defaults.

use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::domain::{ConfigurationError, ScoringConfig};

pub const ENV_MODEL_PATH: &str = "SUBHEALTH_MODEL_PATH";
pub const ENV_MODEL_SHA256: &str = "SUBHEALTH_MODEL_SHA256";
pub const ENV_THRESHOLD: &str = "SUBHEALTH_THRESHOLD";
pub const ENV_THRESHOLD_DATASET: &str = "SUBHEALTH_THRESHOLD_DATASET";
pub const ENV_AMPLIFY_EXPONENT: &str = "SUBHEALTH_AMPLIFY_EXPONENT";
pub const ENV_EXPLAIN: &str = "SUBHEALTH_EXPLAIN";
pub const ENV_LOG_MODE: &str = "SUBHEALTH_LOG_MODE";
pub const ENV_LOG_FILE: &str = "SUBHEALTH_LOG_FILE";
pub const ENV_SANITIZE_MAX_BYTES: &str = "SUBHEALTH_SANITIZE_MAX_BYTES";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "subhealth.log";

/// How the decision threshold is obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdSetting {
    Fixed(f64),
    /// Youden optimum over a labeled CSV
    Youden { dataset: PathBuf },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    Auto,
    File,
    Stdout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub mode: LogMode,
    pub file: PathBuf,
    /// Cap on bytes sanitized per log line
    pub sanitize_max_bytes: usize,
}

impl LogConfig {
    /// Whether to log to the file, given whether stdout is interactive.
    #[must_use]
    pub fn use_file(&self, interactive: bool) -> bool {
        match self.mode {
            LogMode::File => true,
            LogMode::Stdout => false,
            LogMode::Auto => interactive,
        }
    }
}

/// Immutable application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub model_sha256: Option<String>,
    pub threshold: ThresholdSetting,
    pub amplification: Option<f64>,
    pub explain: bool,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_sha256: None,
            threshold: ThresholdSetting::Fixed(ScoringConfig::DEFAULT_THRESHOLD),
            amplification: None,
            explain: true,
            log: LogConfig {
                mode: LogMode::Auto,
                file: PathBuf::from(DEFAULT_LOG_FILE),
                sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
            },
        }
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigurationError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(key, value, "expected a number"))
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if any variable is malformed.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if any value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let model_path = get(ENV_MODEL_PATH).map_or(defaults.model_path, PathBuf::from);
        let model_sha256 = match get(ENV_MODEL_SHA256) {
            Some(v) if v.trim().len() == 64 && v.trim().chars().all(|c| c.is_ascii_hexdigit()) => {
                Some(v.trim().to_string())
            }
            Some(v) => return Err(invalid(ENV_MODEL_SHA256, &v, "expected 64 hex digits")),
            None => None,
        };

        let threshold = match (get(ENV_THRESHOLD), get(ENV_THRESHOLD_DATASET)) {
            (Some(t), Some(_)) => {
                return Err(invalid(
                    ENV_THRESHOLD,
                    &t,
                    "cannot be combined with SUBHEALTH_THRESHOLD_DATASET",
                ))
            }
            (Some(t), None) => {
                let value = parse_f64(ENV_THRESHOLD, &t)?;
                // Range is checked here so the error names the variable.
                if !(value > 0.0 && value < 1.0) {
                    return Err(invalid(ENV_THRESHOLD, &t, "must lie strictly between 0 and 1"));
                }
                ThresholdSetting::Fixed(value)
            }
            (None, Some(path)) => ThresholdSetting::Youden {
                dataset: PathBuf::from(path),
            },
            (None, None) => defaults.threshold,
        };

        let amplification = match get(ENV_AMPLIFY_EXPONENT) {
            None => None,
            Some(v) if v.trim().eq_ignore_ascii_case("off") => None,
            Some(v) => {
                let exponent = parse_f64(ENV_AMPLIFY_EXPONENT, &v)?;
                if !(exponent.is_finite() && exponent > 0.0) {
                    return Err(invalid(ENV_AMPLIFY_EXPONENT, &v, "must be a positive number"));
                }
                Some(exponent)
            }
        };

        let explain = match get(ENV_EXPLAIN) {
            Some(v) => parse_bool(ENV_EXPLAIN, &v)?,
            None => defaults.explain,
        };

        let mode = match get(ENV_LOG_MODE) {
            None => LogMode::Auto,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "auto" => LogMode::Auto,
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                _ => return Err(invalid(ENV_LOG_MODE, &v, "expected file, stdout or auto")),
            },
        };
        let file = get(ENV_LOG_FILE).map_or(defaults.log.file, PathBuf::from);
        let sanitize_max_bytes = match get(ENV_SANITIZE_MAX_BYTES) {
            None => defaults.log.sanitize_max_bytes,
            Some(v) => match v.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(invalid(
                        ENV_SANITIZE_MAX_BYTES,
                        &v,
                        "expected a positive byte count",
                    ))
                }
            },
        };

        Ok(Self {
            model_path,
            model_sha256,
            threshold,
            amplification,
            explain,
            log: LogConfig {
                mode,
                file,
                sanitize_max_bytes,
            },
        })
    }
}
