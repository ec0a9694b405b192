/// Error types for routing and configuration
pub mod error;

/// Shared data model
pub mod events;

/// Error volume forecasting and metric correlation
pub mod prediction;

/// Alert routing and pattern learning
pub mod routing;

/// Thread-safe composition of predictor and router
pub mod service;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, RoutingError};
pub use prediction::ErrorPredictor;
pub use routing::AlertRouter;
pub use service::ErrorIntelligence;
