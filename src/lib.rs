// Library interface for effortrs
// Heart-rate zone, effort and workout quality scoring

pub mod config;
pub mod effort;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod quality;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use effort::EffortClassifier;
pub use quality::WorkoutQualityAnalyzer;
pub use zones::ZoneCalculator;
pub use config::AppConfig;
pub use import::ImportManager;
pub use error::{EffortError, ImportError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
