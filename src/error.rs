use thiserror::Error;

/// Internal failures of the routing pipeline
///
/// These never escape `AlertRouter::route_alert`; they are converted into a
/// fallback decision and logged.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No teams registered")]
    NoTeamsRegistered,

    #[error("Invalid score {score} computed for team '{team_id}'")]
    InvalidScore { team_id: String, score: f64 },

    #[error("Failed to compile routing pattern: {0}")]
    PatternError(#[from] regex::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
