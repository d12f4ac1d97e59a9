use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EffortError;
use crate::logging::LogConfig;
use crate::models::WorkoutType;
use crate::zones::ZoneCalculator;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// The person whose workouts are scored
    pub profile: ProfileConfig,

    /// Scoring defaults
    pub scoring: ScoringSettings,

    /// Logging setup for the CLI
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Personal data used to derive zones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Display name
    pub name: Option<String>,

    /// Measured maximum heart rate in bpm
    pub max_heart_rate: Option<u16>,

    /// Age in years, used for the 220 - age estimate when no max HR is set
    pub age: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Workout type used when none is given on the command line
    pub default_workout_type: WorkoutType,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        ScoringSettings {
            default_workout_type: WorkoutType::Other,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            profile: ProfileConfig::default(),
            scoring: ScoringSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".effortrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Pick the max heart rate to score against.
    ///
    /// An explicit override wins, then the configured max HR, then the age estimate.
    pub fn resolve_max_heart_rate(
        &self,
        override_bpm: Option<u16>,
    ) -> std::result::Result<u16, EffortError> {
        if let Some(bpm) = override_bpm.or(self.profile.max_heart_rate) {
            ZoneCalculator::validate_max_heart_rate(bpm)?;
            return Ok(bpm);
        }

        match self.profile.age {
            Some(age) => {
                let estimate = ZoneCalculator::estimate_max_hr_from_age(age)?;
                tracing::info!(age, estimate, "Estimated max heart rate from age");
                Ok(estimate)
            }
            None => Err(EffortError::Configuration(
                "no max heart rate configured; set profile.max_heart_rate or profile.age"
                    .to_string(),
            )),
        }
    }
}
