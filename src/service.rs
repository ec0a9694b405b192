//! Thread-safe façade over the predictor and the router
//!
//! Each component sits behind its own mutex so ingestion, routing and dashboard
//! queries can come from different threads. A poisoned lock is recovered rather
//! than propagated.

use crate::config::Config;
use crate::events::{
    AlertContext, AlertRoutingDecision, CorrelationAnalysis, ErrorDataPoint, ErrorPrediction,
    HistoricalResolution, TeamExpertise,
};
use crate::prediction::ErrorPredictor;
use crate::routing::{AlertRouter, RouterStatistics};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle composing one [`ErrorPredictor`] and one [`AlertRouter`]
///
/// Cloning the handle shares the underlying state.
#[derive(Debug, Clone)]
pub struct ErrorIntelligence {
    predictor: Arc<Mutex<ErrorPredictor>>,
    router: Arc<Mutex<AlertRouter>>,
}

impl Default for ErrorIntelligence {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ErrorIntelligence {
    pub fn new(config: &Config) -> Self {
        info!(
            "Initializing error intelligence (window {}, history {})",
            config.predictor.window_size, config.router.max_history
        );
        Self {
            predictor: Arc::new(Mutex::new(ErrorPredictor::new(config.predictor.clone()))),
            router: Arc::new(Mutex::new(AlertRouter::new(config.router.clone()))),
        }
    }

    pub fn add_data_point(&self, point: ErrorDataPoint) {
        self.predictor().add_data_point(point);
    }

    pub fn predict_next(&self, hours: usize) -> Vec<ErrorPrediction> {
        self.predictor().predict_next(hours)
    }

    pub fn analyze_correlations(&self) -> CorrelationAnalysis {
        self.predictor().analyze_correlations()
    }

    pub fn accuracy(&self) -> f64 {
        self.predictor().get_accuracy()
    }

    pub fn add_team(&self, team: TeamExpertise) {
        self.router().add_team(team);
    }

    pub fn update_team_availability(&self, team_id: &str, available: bool) -> bool {
        self.router().update_team_availability(team_id, available)
    }

    pub fn update_team_load(&self, team_id: &str, load: f64) -> bool {
        self.router().update_team_load(team_id, load)
    }

    pub fn route_alert(&self, context: &AlertContext) -> AlertRoutingDecision {
        self.router().route_alert(context)
    }

    pub fn record_resolution(&self, resolution: HistoricalResolution) {
        self.router().record_resolution(resolution);
    }

    pub fn statistics(&self) -> RouterStatistics {
        self.router().get_statistics()
    }

    fn predictor(&self) -> MutexGuard<'_, ErrorPredictor> {
        self.predictor.lock().unwrap_or_else(|poisoned| {
            warn!("Predictor lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn router(&self) -> MutexGuard<'_, AlertRouter> {
        self.router.lock().unwrap_or_else(|poisoned| {
            warn!("Router lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
