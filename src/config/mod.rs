/// Configuration management
pub mod config;

pub use config::{
    Config, PatternLearningConfig, PredictorConfig, RiskThresholds, RouterConfig, ScoringWeights,
};
