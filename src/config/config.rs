//! Tunable heuristics for the predictor and the router
//!
//! Every field has a default so a partial TOML file only needs to name the
//! values it overrides.

use crate::error::ConfigError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub predictor: PredictorConfig,
    pub router: RouterConfig,
}

/// Thresholds on `predicted_errors * confidence` used to classify risk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical: 50.0,
            high: 20.0,
            medium: 5.0,
        }
    }
}

/// Error predictor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    /// Sliding window capacity (168 = one week of hourly samples)
    pub window_size: usize,
    /// Number of most recent samples the trend is fitted on
    pub regression_window: usize,
    /// Minimum samples before correlations are computed
    pub min_correlation_points: usize,
    /// Minimum samples carrying system metrics before correlations are computed
    pub min_metric_points: usize,
    /// z-score above which a sample is reported as an anomaly
    pub anomaly_z_threshold: f64,
    pub max_anomalies: usize,
    /// Number of most recent samples used by the accuracy heuristic
    pub accuracy_window: usize,
    /// Correlation above which a scaling recommendation is made
    pub strong_correlation: f64,
    /// Significance above which a scaling recommendation is made
    pub min_significance: f64,
    /// Accuracy below which more data is requested
    pub low_accuracy: f64,
    pub risk: RiskThresholds,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            window_size: 168,
            regression_window: 24,
            min_correlation_points: 10,
            min_metric_points: 5,
            anomaly_z_threshold: 2.0,
            max_anomalies: 5,
            accuracy_window: 10,
            strong_correlation: 0.7,
            min_significance: 0.8,
            low_accuracy: 0.6,
            risk: RiskThresholds::default(),
        }
    }
}

/// Relative weights of the team scoring factors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub expertise: f64,
    pub severity: f64,
    pub load: f64,
    pub history: f64,
    /// Expertise factor for a team that does not list the alert category
    pub expertise_mismatch: f64,
    /// Severity factor for a team that does not prefer the alert severity
    pub severity_mismatch: f64,
    /// Response time in minutes at which the response-time bonus reaches zero
    pub response_time_horizon: f64,
    /// Lowest response-time adjustment factor
    pub response_time_floor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            expertise: 0.4,
            severity: 0.2,
            load: 0.2,
            history: 0.2,
            expertise_mismatch: 0.3,
            severity_mismatch: 0.5,
            response_time_horizon: 120.0,
            response_time_floor: 0.8,
        }
    }
}

/// Confidence bookkeeping for learned keyword patterns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternLearningConfig {
    pub success_confidence: f64,
    pub failure_confidence: f64,
    /// Confidence adjustment applied per observed outcome
    pub step: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// Terms must be strictly longer than this
    pub min_term_length: usize,
    /// Maximum learned patterns before the weakest one is evicted
    pub max_patterns: usize,
}

impl Default for PatternLearningConfig {
    fn default() -> Self {
        Self {
            success_confidence: 0.8,
            failure_confidence: 0.3,
            step: 0.1,
            min_confidence: 0.1,
            max_confidence: 0.95,
            min_term_length: 3,
            max_patterns: 500,
        }
    }
}

/// Alert router settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum number of resolutions kept for statistics and escalation
    pub max_history: usize,
    /// First hour (inclusive) of business hours
    pub business_hours_start: u32,
    /// Last hour (exclusive) of business hours
    pub business_hours_end: u32,
    /// Offset from UTC used for business hours; system local time when unset
    pub utc_offset_minutes: Option<i32>,
    /// Minimum escalation level outside business hours
    pub off_hours_min_escalation: u8,
    /// Window in minutes used to detect a burst of resolutions
    pub recent_window_minutes: i64,
    /// Escalate when strictly more resolutions than this fall in the window
    pub recent_resolution_threshold: usize,
    pub fallback_escalation: u8,
    pub fallback_confidence: f64,
    /// Channels used when the primary team is not registered
    pub default_channels: Vec<String>,
    /// Estimated response time in minutes when the primary team is not registered
    pub default_response_time: f64,
    pub weights: ScoringWeights,
    pub patterns: PatternLearningConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_history: 1000,
            business_hours_start: 9,
            business_hours_end: 17,
            utc_offset_minutes: None,
            off_hours_min_escalation: 3,
            recent_window_minutes: 60,
            recent_resolution_threshold: 5,
            fallback_escalation: 3,
            fallback_confidence: 0.3,
            default_channels: vec!["slack".to_string(), "email".to_string()],
            default_response_time: 30.0,
            weights: ScoringWeights::default(),
            patterns: PatternLearningConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Fixed offset used for business hours, if one is configured
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read, `TomlError` if it
    /// is not valid TOML and `ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is within its usable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let predictor = &self.predictor;
        if predictor.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "predictor.window_size must be greater than 0".to_string(),
            ));
        }
        if predictor.regression_window < 2 {
            return Err(ConfigError::ValidationError(
                "predictor.regression_window must be at least 2".to_string(),
            ));
        }
        if predictor.accuracy_window < 2 {
            return Err(ConfigError::ValidationError(
                "predictor.accuracy_window must be at least 2".to_string(),
            ));
        }
        let risk = &predictor.risk;
        if !(risk.medium <= risk.high && risk.high <= risk.critical) {
            return Err(ConfigError::ValidationError(
                "predictor.risk thresholds must satisfy medium <= high <= critical".to_string(),
            ));
        }

        let router = &self.router;
        if router.max_history == 0 {
            return Err(ConfigError::ValidationError(
                "router.max_history must be greater than 0".to_string(),
            ));
        }
        if router.business_hours_start >= router.business_hours_end
            || router.business_hours_end > 24
        {
            return Err(ConfigError::ValidationError(format!(
                "router business hours {}..{} are not a valid range",
                router.business_hours_start, router.business_hours_end
            )));
        }
        if router.utc_offset_minutes.is_some() && router.fixed_offset().is_none() {
            return Err(ConfigError::ValidationError(
                "router.utc_offset_minutes must be within +/- 24 hours".to_string(),
            ));
        }
        for level in [router.off_hours_min_escalation, router.fallback_escalation] {
            if !(1..=5).contains(&level) {
                return Err(ConfigError::ValidationError(format!(
                    "escalation level {} must be between 1 and 5",
                    level
                )));
            }
        }
        if !(0.0..=1.0).contains(&router.fallback_confidence) {
            return Err(ConfigError::ValidationError(
                "router.fallback_confidence must be between 0 and 1".to_string(),
            ));
        }
        if router.default_channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "router.default_channels must not be empty".to_string(),
            ));
        }

        let weights = &router.weights;
        let all_weights = [
            weights.expertise,
            weights.severity,
            weights.load,
            weights.history,
            weights.expertise_mismatch,
            weights.severity_mismatch,
        ];
        if all_weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(ConfigError::ValidationError(
                "router.weights must all be between 0 and 1".to_string(),
            ));
        }
        if weights.response_time_horizon <= 0.0 || !(0.0..=1.0).contains(&weights.response_time_floor)
        {
            return Err(ConfigError::ValidationError(
                "router.weights response-time settings are out of range".to_string(),
            ));
        }

        let patterns = &router.patterns;
        if !(0.0 < patterns.min_confidence
            && patterns.min_confidence <= patterns.max_confidence
            && patterns.max_confidence <= 1.0)
        {
            return Err(ConfigError::ValidationError(
                "router.patterns confidence bounds must satisfy 0 < min <= max <= 1".to_string(),
            ));
        }
        if patterns.max_patterns == 0 {
            return Err(ConfigError::ValidationError(
                "router.patterns.max_patterns must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
