//! Correlation of error volume with system metrics
//!
//! Correlations are only computed when every sample in the window carries
//! system metrics. Partially instrumented windows report no correlations.

use crate::config::PredictorConfig;
use crate::events::{
    AnomalyDetection, CorrelationAnalysis, ErrorDataPoint, MetricCorrelation, SystemMetrics,
};
use crate::prediction::stats::{mean, pearson, std_dev};
use log::debug;

/// Metrics correlated against error count
const CORRELATED_METRICS: [&str; 3] = ["responseTime", "requestRate", "memoryUsage"];

const STRONG_SIGNIFICANCE: f64 = 0.9;
const WEAK_SIGNIFICANCE_SCALE: f64 = 0.8;
const STRONG_CORRELATION: f64 = 0.5;

/// Analyze `points` (chronological) for metric correlations and anomalies
///
/// `accuracy` is the predictor's stability heuristic and only feeds the
/// recommendations.
pub fn analyze(
    points: &[&ErrorDataPoint],
    accuracy: f64,
    config: &PredictorConfig,
) -> CorrelationAnalysis {
    let metric_points = points.iter().filter(|p| p.system_metrics.is_some()).count();

    if points.len() < config.min_correlation_points || metric_points < config.min_metric_points {
        debug!(
            "Insufficient data for correlation analysis: {} samples, {} with metrics",
            points.len(),
            metric_points
        );
        return CorrelationAnalysis {
            correlated_metrics: Vec::new(),
            anomaly_detections: Vec::new(),
            recommendations: vec![format!(
                "Insufficient data for correlation analysis: need at least {} samples with {} carrying system metrics (have {} and {})",
                config.min_correlation_points,
                config.min_metric_points,
                points.len(),
                metric_points
            )],
        };
    }

    let correlated_metrics = correlate(points);
    let anomaly_detections = detect_anomalies(points, config);
    let recommendations =
        recommend(&correlated_metrics, &anomaly_detections, accuracy, config);

    CorrelationAnalysis {
        correlated_metrics,
        anomaly_detections,
        recommendations,
    }
}

fn correlate(points: &[&ErrorDataPoint]) -> Vec<MetricCorrelation> {
    let metrics: Option<Vec<&SystemMetrics>> =
        points.iter().map(|p| p.system_metrics.as_ref()).collect();
    let metrics = match metrics {
        Some(metrics) => metrics,
        None => {
            debug!("Skipping correlations: not every sample carries system metrics");
            return Vec::new();
        }
    };

    let errors: Vec<f64> = points.iter().map(|p| p.error_count as f64).collect();

    let mut correlations: Vec<MetricCorrelation> = CORRELATED_METRICS
        .iter()
        .map(|name| {
            let series: Vec<f64> = metrics.iter().map(|m| metric_value(name, m)).collect();
            let correlation = pearson(&errors, &series);
            let significance = if correlation.abs() > STRONG_CORRELATION {
                STRONG_SIGNIFICANCE
            } else {
                WEAK_SIGNIFICANCE_SCALE * correlation.abs()
            };
            MetricCorrelation {
                metric: name.to_string(),
                correlation,
                significance: significance.clamp(0.0, 1.0),
                description: describe(name, correlation),
            }
        })
        .collect();

    correlations.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
    correlations
}

fn metric_value(metric: &str, metrics: &SystemMetrics) -> f64 {
    match metric {
        "responseTime" => metrics.response_time,
        "requestRate" => metrics.request_rate,
        "memoryUsage" => metrics.memory_usage,
        _ => 0.0,
    }
}

fn describe(metric: &str, correlation: f64) -> String {
    let strength = match correlation.abs() {
        c if c > 0.7 => "Strong",
        c if c > 0.4 => "Moderate",
        c if c > 0.1 => "Weak",
        _ => return format!("No meaningful correlation between error count and {}", metric),
    };
    let direction = if correlation > 0.0 { "positive" } else { "negative" };
    format!(
        "{} {} correlation between error count and {}",
        strength, direction, metric
    )
}

fn detect_anomalies(points: &[&ErrorDataPoint], config: &PredictorConfig) -> Vec<AnomalyDetection> {
    let errors: Vec<f64> = points.iter().map(|p| p.error_count as f64).collect();
    let expected = mean(&errors);
    let spread = match std_dev(&errors) {
        s if s == 0.0 => 1.0,
        s => s,
    };

    points
        .iter()
        .zip(&errors)
        .filter_map(|(point, value)| {
            let deviation = (value - expected).abs() / spread;
            (deviation > config.anomaly_z_threshold).then(|| AnomalyDetection {
                timestamp: point.timestamp,
                metric: "errorCount".to_string(),
                value: *value,
                expected,
                deviation,
            })
        })
        .take(config.max_anomalies)
        .collect()
}

fn recommend(
    correlations: &[MetricCorrelation],
    anomalies: &[AnomalyDetection],
    accuracy: f64,
    config: &PredictorConfig,
) -> Vec<String> {
    let strong = |metric: &str| {
        correlations.iter().any(|c| {
            c.metric == metric
                && c.correlation > config.strong_correlation
                && c.significance > config.min_significance
        })
    };

    let mut recommendations = Vec::new();
    if strong("responseTime") {
        recommendations.push(
            "Errors rise with response time: consider scaling out to reduce latency".to_string(),
        );
    }
    if strong("memoryUsage") {
        recommendations.push(
            "Errors rise with memory usage: optimize memory consumption or add capacity"
                .to_string(),
        );
    }
    if !anomalies.is_empty() {
        recommendations.push(format!(
            "Investigate {} anomalous error spike(s) in the recent window",
            anomalies.len()
        ));
    }
    if accuracy < config.low_accuracy {
        recommendations.push(
            "Error volume is volatile: collect more data to improve forecast accuracy".to_string(),
        );
    }
    if recommendations.is_empty() {
        recommendations.push("Error patterns are stable; no action required".to_string());
    }
    recommendations
}
