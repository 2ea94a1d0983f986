use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SimError;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default prepared dataset (teams.json)
    pub dataset_path: Option<PathBuf>,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Simulation policy constants
    pub simulation: SimulationPolicy,

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

/// Tunable constants of the injury and recovery model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationPolicy {
    /// Season length the per-season injury rate is spread over
    pub days_per_season: f64,

    /// Risk multiplier while inside a post-injury recovery window
    pub recovery_risk_multiplier: f64,

    /// Recovery window length as a fraction of days missed
    pub recovery_window_fraction: f64,

    pub recovery_window_min_days: u32,

    pub recovery_window_max_days: u32,

    /// Bounds on sampled injury duration
    pub min_injury_days: u32,

    pub max_injury_days: u32,

    /// Score assumed for athletes with no tracked fatigue yet
    pub initial_fatigue: u8,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        SimulationPolicy {
            days_per_season: 365.0,
            recovery_risk_multiplier: 1.5,
            recovery_window_fraction: 0.3,
            recovery_window_min_days: 3,
            recovery_window_max_days: 14,
            min_injury_days: 1,
            max_injury_days: 120,
            initial_fatigue: 30,
        }
    }
}

impl SimulationPolicy {
    /// Reject policies that would break the model's invariants
    pub fn validate(&self) -> std::result::Result<(), SimError> {
        let invalid = |reason: String| Err(SimError::Configuration(reason));

        if !self.days_per_season.is_finite() || self.days_per_season <= 0.0 {
            return invalid(format!("days_per_season must be positive, got {}", self.days_per_season));
        }
        if !self.recovery_risk_multiplier.is_finite() || self.recovery_risk_multiplier < 1.0 {
            return invalid(format!(
                "recovery_risk_multiplier must be >= 1.0, got {}",
                self.recovery_risk_multiplier
            ));
        }
        if !self.recovery_window_fraction.is_finite() || self.recovery_window_fraction < 0.0 {
            return invalid(format!(
                "recovery_window_fraction must be non-negative, got {}",
                self.recovery_window_fraction
            ));
        }
        if self.recovery_window_min_days > self.recovery_window_max_days {
            return invalid(format!(
                "recovery window bounds inverted: {} > {}",
                self.recovery_window_min_days, self.recovery_window_max_days
            ));
        }
        if self.min_injury_days == 0 || self.min_injury_days > self.max_injury_days {
            return invalid(format!(
                "injury duration bounds must satisfy 1 <= min <= max, got {}..={}",
                self.min_injury_days, self.max_injury_days
            ));
        }
        if self.initial_fatigue > crate::fatigue::MAX_FATIGUE {
            return invalid(format!("initial_fatigue must be <= 100, got {}", self.initial_fatigue));
        }

        Ok(())
    }

    /// Length of the elevated-risk window after an injury of `days_missed`
    pub fn recovery_window_days(&self, days_missed: u32) -> u32 {
        let days = (days_missed as f64 * self.recovery_window_fraction).round() as u32;
        days.clamp(self.recovery_window_min_days, self.recovery_window_max_days)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            dataset_path: None,
            metadata: ConfigMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: now,
                updated_at: now,
            },
            simulation: SimulationPolicy::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.simulation.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
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
            .join(".injury-sim")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %e,
                    "Config not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(SimulationPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_policies() {
        let policy = SimulationPolicy {
            recovery_window_min_days: 20,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = SimulationPolicy {
            min_injury_days: 0,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = SimulationPolicy {
            recovery_risk_multiplier: 0.5,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = SimulationPolicy {
            initial_fatigue: 101,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_recovery_window_days() {
        let policy = SimulationPolicy::default();
        assert_eq!(policy.recovery_window_days(1), 3);
        assert_eq!(policy.recovery_window_days(9), 3);
        assert_eq!(policy.recovery_window_days(20), 6);
        assert_eq!(policy.recovery_window_days(30), 9);
        assert_eq!(policy.recovery_window_days(120), 14);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.simulation, config.simulation);
        assert_eq!(deserialized.metadata.version, config.metadata.version);
    }

    #[test]
    fn test_partial_policy_uses_defaults() {
        let policy: SimulationPolicy = toml::from_str("recovery_risk_multiplier = 2.0").unwrap();
        assert_eq!(policy.recovery_risk_multiplier, 2.0);
        assert_eq!(policy.max_injury_days, 120);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.simulation.recovery_window_max_days = 21;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.simulation.recovery_window_max_days, 21);
    }

    #[test]
    fn test_load_rejects_invalid_policy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.simulation.min_injury_days = 200;
        config.save_to_file(&path).unwrap();

        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
