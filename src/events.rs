//! Core data model for error forecasting and alert routing
//!
//! This module defines the fundamental data structures shared by the predictor and
//! the router: error samples, forecasts, correlation results, team registry entries,
//! resolution outcomes and routing decisions. Every type is serializable so callers
//! can persist windows and histories verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Maximum number of entries an alert's metadata map may hold
pub const MAX_METADATA_ENTRIES: usize = 32;

/// System resource snapshot attached to an error sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    /// Mean response time in milliseconds
    pub response_time: f64,
    /// Memory usage as a percentage (0-100)
    pub memory_usage: f64,
    /// CPU usage as a percentage (0-100)
    pub cpu_usage: f64,
    /// Requests per second
    pub request_rate: f64,
    /// Concurrent active users
    pub user_count: u64,
}

/// One aggregated error sample, typically covering an hour of traffic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDataPoint {
    /// End of the sampling interval
    pub timestamp: Timestamp,
    /// Number of errors observed in the interval
    pub error_count: u64,
    /// Mean severity of the observed errors (0-1)
    pub error_severity: f64,
    /// Fraction of errors per category
    #[serde(default)]
    pub category_distribution: BTreeMap<ErrorCategory, f64>,
    /// Resource metrics, when the ingester could sample them
    #[serde(default)]
    pub system_metrics: Option<SystemMetrics>,
}

/// Coarse classification of a forecast
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Descriptive input that contributed to a forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionFactor {
    pub name: String,
    /// Signed influence on the forecast (-1 to 1)
    pub impact: f64,
    pub value: f64,
    pub unit: String,
}

/// Forecast of error volume for one future interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPrediction {
    pub timestamp: Timestamp,
    pub predicted_errors: f64,
    /// Goodness of fit of the trend (0-1)
    pub confidence: f64,
    pub factors: Vec<PredictionFactor>,
    pub risk_level: RiskLevel,
}

/// Linear association between error volume and one system metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCorrelation {
    pub metric: String,
    pub correlation: f64,
    pub significance: f64,
    pub description: String,
}

/// A sample whose error count deviates strongly from the window mean
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyDetection {
    pub timestamp: Timestamp,
    pub metric: String,
    pub value: f64,
    pub expected: f64,
    /// Deviation in standard deviations
    pub deviation: f64,
}

/// Result of correlating error volume with system metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationAnalysis {
    pub correlated_metrics: Vec<MetricCorrelation>,
    pub anomaly_detections: Vec<AnomalyDetection>,
    pub recommendations: Vec<String>,
}

/// Error categories used for team expertise and alert classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Network,
    Database,
    Payment,
    Authentication,
    Validation,
    Performance,
    ExternalApi,
    Booking,
    Ui,
    Unknown,
}

/// Alert severity as classified by the alert source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Normal,
    High,
    Critical,
}

/// Scalar metadata value attached to an alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// Everything the router knows about an incoming alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertContext {
    pub alert_id: String,
    pub error_id: String,
    pub category: ErrorCategory,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "bounded_metadata")]
    pub metadata: HashMap<String, MetadataValue>,
}

/// Reject metadata maps larger than [`MAX_METADATA_ENTRIES`]
fn bounded_metadata<'de, D>(deserializer: D) -> Result<HashMap<String, MetadataValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let metadata = HashMap::<String, MetadataValue>::deserialize(deserializer)?;
    if metadata.len() > MAX_METADATA_ENTRIES {
        return Err(serde::de::Error::custom(format!(
            "alert metadata has {} entries, at most {} are allowed",
            metadata.len(),
            MAX_METADATA_ENTRIES
        )));
    }
    Ok(metadata)
}

impl AlertContext {
    /// Create an alert context without endpoint, user or metadata
    pub fn new(
        alert_id: impl Into<String>,
        error_id: impl Into<String>,
        category: ErrorCategory,
        severity: AlertSeverity,
        message: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            alert_id: alert_id.into(),
            error_id: error_id.into(),
            category,
            severity,
            message: message.into(),
            endpoint: None,
            user_id: None,
            timestamp,
            metadata: HashMap::new(),
        }
    }

    /// Set the endpoint the error was raised on
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Insert a metadata entry
    ///
    /// Existing keys are overwritten. New keys are rejected once the map holds
    /// [`MAX_METADATA_ENTRIES`] entries.
    ///
    /// # Returns
    ///
    /// `true` if the value was stored
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: MetadataValue) -> bool {
        let key = key.into();
        if !self.metadata.contains_key(&key) && self.metadata.len() >= MAX_METADATA_ENTRIES {
            return false;
        }
        self.metadata.insert(key, value);
        true
    }
}

/// Registry entry describing a response team
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamExpertise {
    pub team_id: String,
    pub team_name: String,
    pub expertise_areas: HashSet<ErrorCategory>,
    pub preferred_severities: HashSet<AlertSeverity>,
    /// Typical time to first response in minutes
    pub response_time: f64,
    /// Historical resolution rate as a percentage (0-100)
    pub resolution_rate: f64,
    /// Current load as a percentage (0-100)
    pub current_load: f64,
    pub available: bool,
    pub notification_channels: Vec<String>,
}

/// Outcome of a resolved alert, fed back for pattern learning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalResolution {
    /// Free-text description of the error that was resolved
    pub error_pattern: String,
    pub team_id: String,
    /// Time to resolution in minutes
    pub resolution_time: f64,
    pub success: bool,
    pub timestamp: Timestamp,
}

/// The router's answer for a single alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertRoutingDecision {
    pub alert_id: String,
    pub error_id: String,
    pub primary_team: String,
    pub secondary_team: Option<String>,
    /// Urgency tier (1-5)
    pub escalation_level: u8,
    /// Expected time to first response in minutes
    pub estimated_response_time: f64,
    pub confidence: f64,
    pub routing_reason: String,
    pub notification_channels: Vec<String>,
    pub timestamp: Timestamp,
}
