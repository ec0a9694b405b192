use crate::config::PredictorConfig;
use crate::events::{
    CorrelationAnalysis, ErrorDataPoint, ErrorPrediction, PredictionFactor, RiskLevel,
};
use crate::prediction::correlation;
use crate::prediction::stats::{mean, std_dev, LinearFit};
use crate::prediction::SlidingWindow;
use chrono::Duration;
use log::{debug, warn};

const ERROR_TREND_IMPACT: f64 = 0.4;
const SEVERITY_TREND_IMPACT: f64 = 0.3;
const RESPONSE_TIME_IMPACT: f64 = 0.2;
const REQUEST_RATE_IMPACT: f64 = 0.1;

/// Trend-based error volume forecaster
///
/// The ErrorPredictor keeps a bounded window of hourly error samples and answers
/// forecast and correlation queries on demand. Queries never mutate the window
/// and never fail: insufficient data yields empty or low-confidence results.
#[derive(Debug, Clone)]
pub struct ErrorPredictor {
    window: SlidingWindow,
    config: PredictorConfig,
}

impl Default for ErrorPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl ErrorPredictor {
    /// Create a predictor with the window capacity and thresholds from `config`
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            window: SlidingWindow::new(config.window_size),
            config,
        }
    }

    /// Append a sample to the window
    ///
    /// The oldest sample is evicted once the window is full. Timestamps are
    /// expected to be monotonic; this is not checked.
    pub fn add_data_point(&mut self, point: ErrorDataPoint) {
        let evicted = self.window.push(point);
        if evicted > 0 {
            debug!(
                "Error window at capacity ({}), evicted {} oldest sample(s)",
                self.window.capacity(),
                evicted
            );
        }
    }

    /// Forecast error volume for each of the next `hours` intervals
    ///
    /// Fits a least-squares trend over the most recent samples and extrapolates
    /// it. Returns an empty vector when fewer than two samples are available.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil::prediction::ErrorPredictor;
    ///
    /// let predictor = ErrorPredictor::default();
    /// assert!(predictor.predict_next(3).is_empty());
    /// ```
    pub fn predict_next(&self, hours: usize) -> Vec<ErrorPrediction> {
        if self.window.len() < 2 {
            debug!(
                "Not enough samples to forecast ({} of 2 required)",
                self.window.len()
            );
            return Vec::new();
        }

        let recent: Vec<&ErrorDataPoint> =
            self.window.tail(self.config.regression_window).collect();
        let counts: Vec<f64> = recent.iter().map(|p| p.error_count as f64).collect();

        let fit = match LinearFit::fit(&counts) {
            Some(fit) => fit,
            None => {
                warn!("Trend fit failed over {} samples", counts.len());
                return Vec::new();
            }
        };

        let last = recent[recent.len() - 1];
        let factors = Self::derive_factors(recent[recent.len() - 2], last);
        let n = counts.len();

        (1..=hours)
            .map(|offset| {
                let predicted_errors = fit.at((n + offset - 1) as f64).max(0.0);
                let confidence = fit.r_squared.clamp(0.0, 1.0);
                ErrorPrediction {
                    timestamp: last.timestamp + Duration::hours(offset as i64),
                    predicted_errors,
                    confidence,
                    factors: factors.clone(),
                    risk_level: self.risk_level(predicted_errors, confidence),
                }
            })
            .collect()
    }

    /// Correlate error volume with system metrics and flag anomalous samples
    pub fn analyze_correlations(&self) -> CorrelationAnalysis {
        let points: Vec<&ErrorDataPoint> = self.window.iter().collect();
        correlation::analyze(&points, self.get_accuracy(), &self.config)
    }

    /// No-op kept for interface parity with model-based predictors
    pub fn train(&mut self) {}

    /// Stability of the most recent error counts (0-1)
    ///
    /// Computed as `1 - stddev / mean` over the accuracy window and floored at 0.
    /// This is a stability heuristic rather than validated forecast accuracy.
    /// Returns 0 until the accuracy window is filled.
    pub fn get_accuracy(&self) -> f64 {
        let window = self.config.accuracy_window;
        if self.window.len() < window {
            return 0.0;
        }

        let counts: Vec<f64> = self
            .window
            .tail(window)
            .map(|p| p.error_count as f64)
            .collect();
        let m = mean(&counts);
        if m == 0.0 {
            // A run of error-free intervals is perfectly stable
            return 1.0;
        }
        (1.0 - std_dev(&counts) / m).max(0.0)
    }

    /// Classify a forecast by `predicted_errors * confidence`
    pub fn risk_level(&self, predicted_errors: f64, confidence: f64) -> RiskLevel {
        let risk_score = predicted_errors * confidence;
        let thresholds = &self.config.risk;
        if risk_score > thresholds.critical {
            RiskLevel::Critical
        } else if risk_score > thresholds.high {
            RiskLevel::High
        } else if risk_score > thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Number of samples currently in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn latest(&self) -> Option<&ErrorDataPoint> {
        self.window.latest()
    }

    /// Samples in chronological order, for persistence by the caller
    pub fn points(&self) -> Vec<ErrorDataPoint> {
        self.window.iter().cloned().collect()
    }

    fn derive_factors(previous: &ErrorDataPoint, current: &ErrorDataPoint) -> Vec<PredictionFactor> {
        let mut factors = vec![
            Self::factor(
                "Error Trend",
                current.error_count as f64 - previous.error_count as f64,
                ERROR_TREND_IMPACT,
                "errors",
            ),
            Self::factor(
                "Severity Trend",
                current.error_severity - previous.error_severity,
                SEVERITY_TREND_IMPACT,
                "severity",
            ),
        ];

        if let (Some(prev), Some(curr)) = (&previous.system_metrics, &current.system_metrics) {
            factors.push(Self::factor(
                "Response Time",
                curr.response_time - prev.response_time,
                RESPONSE_TIME_IMPACT,
                "ms",
            ));
            factors.push(Self::factor(
                "Request Rate",
                curr.request_rate - prev.request_rate,
                REQUEST_RATE_IMPACT,
                "req/s",
            ));
        }

        factors
    }

    fn factor(name: &str, delta: f64, weight: f64, unit: &str) -> PredictionFactor {
        let impact = if delta > 0.0 {
            weight
        } else if delta < 0.0 {
            -weight
        } else {
            0.0
        };
        PredictionFactor {
            name: name.to_string(),
            impact,
            value: delta,
            unit: unit.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SystemMetrics;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn create_point(hour: i64, error_count: u64) -> ErrorDataPoint {
        ErrorDataPoint {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap() + Duration::hours(hour),
            error_count,
            error_severity: 0.3,
            category_distribution: BTreeMap::new(),
            system_metrics: None,
        }
    }

    fn with_metrics(mut point: ErrorDataPoint, response_time: f64, request_rate: f64) -> ErrorDataPoint {
        point.system_metrics = Some(SystemMetrics {
            response_time,
            memory_usage: 50.0,
            cpu_usage: 40.0,
            request_rate,
            user_count: 100,
        });
        point
    }

    fn predictor_with(counts: &[u64]) -> ErrorPredictor {
        let mut predictor = ErrorPredictor::default();
        for (i, count) in counts.iter().enumerate() {
            predictor.add_data_point(create_point(i as i64, *count));
        }
        predictor
    }

    #[test]
    fn test_predict_next_requires_two_points() {
        assert!(predictor_with(&[]).predict_next(1).is_empty());
        assert!(predictor_with(&[5]).predict_next(4).is_empty());
        assert_eq!(predictor_with(&[5, 6]).predict_next(4).len(), 4);
    }

    #[test]
    fn test_predict_next_extrapolates_linear_trend() {
        let predictor = predictor_with(&[10, 12, 14, 16]);
        let predictions = predictor.predict_next(2);

        assert_eq!(predictions.len(), 2);
        assert!((predictions[0].predicted_errors - 18.0).abs() < 1e-9);
        assert!((predictions[1].predicted_errors - 20.0).abs() < 1e-9);
        assert!((predictions[0].confidence - 1.0).abs() < 1e-9);
        assert_eq!(
            predictions[1].timestamp,
            predictor.latest().unwrap().timestamp + Duration::hours(2)
        );
    }

    #[test]
    fn test_predict_next_clamps_to_zero() {
        let predictions = predictor_with(&[30, 20, 10, 0]).predict_next(3);
        assert!(predictions.iter().all(|p| p.predicted_errors == 0.0));
        assert!(predictions.iter().all(|p| p.risk_level == RiskLevel::Low));
    }

    #[test]
    fn test_predict_next_uses_only_recent_samples() {
        // A long flat history followed by a steady climb over the last 24 samples
        let mut counts = vec![500; 40];
        counts.extend((0..24).map(|i| i as u64));
        let predictions = predictor_with(&counts).predict_next(1);
        assert!((predictions[0].predicted_errors - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_next_zero_hours() {
        assert!(predictor_with(&[1, 2, 3]).predict_next(0).is_empty());
    }

    #[test]
    fn test_factors_without_metrics() {
        let predictions = predictor_with(&[4, 9]).predict_next(1);
        let factors = &predictions[0].factors;

        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].name, "Error Trend");
        assert_eq!(factors[0].value, 5.0);
        assert_eq!(factors[0].impact, ERROR_TREND_IMPACT);
        assert_eq!(factors[1].name, "Severity Trend");
        assert_eq!(factors[1].impact, 0.0);
    }

    #[test]
    fn test_factors_with_metrics_on_both_points() {
        let mut predictor = ErrorPredictor::default();
        predictor.add_data_point(with_metrics(create_point(0, 10), 200.0, 50.0));
        predictor.add_data_point(with_metrics(create_point(1, 8), 350.0, 40.0));

        let factors = &predictor.predict_next(1)[0].factors;
        assert_eq!(factors.len(), 4);
        assert_eq!(factors[0].impact, -ERROR_TREND_IMPACT);
        assert_eq!(factors[2].name, "Response Time");
        assert_eq!(factors[2].value, 150.0);
        assert_eq!(factors[2].impact, RESPONSE_TIME_IMPACT);
        assert_eq!(factors[3].name, "Request Rate");
        assert_eq!(factors[3].impact, -REQUEST_RATE_IMPACT);
        assert!(factors.iter().all(|f| (-1.0..=1.0).contains(&f.impact)));
    }

    #[test]
    fn test_factors_skip_metrics_when_one_point_lacks_them() {
        let mut predictor = ErrorPredictor::default();
        predictor.add_data_point(create_point(0, 10));
        predictor.add_data_point(with_metrics(create_point(1, 12), 350.0, 40.0));
        assert_eq!(predictor.predict_next(1)[0].factors.len(), 2);
    }

    #[test]
    fn test_risk_level_thresholds() {
        let predictor = ErrorPredictor::default();
        assert_eq!(predictor.risk_level(60.0, 1.0), RiskLevel::Critical);
        assert_eq!(predictor.risk_level(30.0, 1.0), RiskLevel::High);
        assert_eq!(predictor.risk_level(10.0, 1.0), RiskLevel::Medium);
        assert_eq!(predictor.risk_level(3.0, 1.0), RiskLevel::Low);
        // Confidence scales the score
        assert_eq!(predictor.risk_level(60.0, 0.5), RiskLevel::High);
        // Thresholds are strict
        assert_eq!(predictor.risk_level(50.0, 1.0), RiskLevel::High);
    }

    #[test]
    fn test_window_eviction_after_overflow() {
        let mut predictor = ErrorPredictor::default();
        let capacity = predictor.capacity();
        for i in 0..capacity + 5 {
            predictor.add_data_point(create_point(i as i64, i as u64));
        }
        assert_eq!(predictor.len(), capacity);
        assert_eq!(predictor.points()[0].error_count, 5);
    }

    #[test]
    fn test_accuracy_requires_ten_points() {
        assert_eq!(predictor_with(&[5; 9]).get_accuracy(), 0.0);
        assert_eq!(predictor_with(&[5; 10]).get_accuracy(), 1.0);
    }

    #[test]
    fn test_accuracy_of_volatile_series_is_floored() {
        let accuracy = predictor_with(&[0, 100, 0, 100, 0, 100, 0, 100, 0, 100]).get_accuracy();
        assert_eq!(accuracy, 0.0);

        let accuracy = predictor_with(&[9, 11, 9, 11, 9, 11, 9, 11, 9, 11]).get_accuracy();
        assert!((accuracy - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_of_error_free_run() {
        assert_eq!(predictor_with(&[0; 12]).get_accuracy(), 1.0);
    }

    #[test]
    fn test_train_is_a_no_op() {
        let mut predictor = predictor_with(&[1, 2, 3]);
        let before = predictor.points();
        predictor.train();
        assert_eq!(predictor.points(), before);
    }
}

// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::Utc;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use std::collections::BTreeMap;

    /// Generate a short error-count history (0-60 samples)
    #[derive(Debug, Clone)]
    struct ErrorHistory(Vec<u64>);

    impl Arbitrary for ErrorHistory {
        fn arbitrary(g: &mut Gen) -> Self {
            let size = usize::arbitrary(g) % 61;
            ErrorHistory((0..size).map(|_| (u16::arbitrary(g) % 1000) as u64).collect())
        }
    }

    #[quickcheck]
    fn prop_predictions_are_non_negative_with_bounded_confidence(
        history: ErrorHistory,
        hours: u8,
    ) -> bool {
        let mut predictor = ErrorPredictor::default();
        let start = Utc::now();
        for (i, count) in history.0.iter().enumerate() {
            predictor.add_data_point(ErrorDataPoint {
                timestamp: start + Duration::hours(i as i64),
                error_count: *count,
                error_severity: 0.5,
                category_distribution: BTreeMap::new(),
                system_metrics: None,
            });
        }

        let hours = (hours % 48) as usize;
        let predictions = predictor.predict_next(hours);

        let expected_len = if history.0.len() < 2 { 0 } else { hours };
        let accuracy = predictor.get_accuracy();

        predictions.len() == expected_len
            && predictions.iter().all(|p| {
                p.predicted_errors >= 0.0 && (0.0..=1.0).contains(&p.confidence)
            })
            && (0.0..=1.0).contains(&accuracy)
    }
}
