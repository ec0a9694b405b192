/// Error volume forecasting and metric correlation
pub mod correlation;
pub mod predictor;
pub mod stats;
pub mod window;

pub use predictor::ErrorPredictor;
pub use window::SlidingWindow;
