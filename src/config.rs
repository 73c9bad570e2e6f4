//! Tracker configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::types::ActivityType;

/// Configuration for the session store and controller.
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// SQLite database path (`:memory:` for an ephemeral store)
    pub database_path: String,
    /// Interval of the elapsed-time display tick, in milliseconds
    pub display_tick_ms: u64,
    /// Body weight used for the live calorie readout
    pub weight_kg: f64,
    /// Activity preselected by the UI
    pub default_activity: ActivityType,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_path: "run_tracker.db".to_string(),
            display_tick_ms: 1000,
            weight_kg: 70.0,
            default_activity: ActivityType::Running,
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)
            .map_err(|e| TrackerError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.trim().is_empty() {
            return Err(TrackerError::config("databasePath must not be empty"));
        }
        if self.display_tick_ms == 0 {
            return Err(TrackerError::config("displayTickMs must be positive"));
        }
        validate_weight(self.weight_kg)
    }
}

/// Body weight must be a finite, positive number of kilograms.
pub(crate) fn validate_weight(weight_kg: f64) -> Result<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(TrackerError::config(format!(
            "weightKg must be a positive number, got {}",
            weight_kg
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.display_tick_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config =
            TrackerConfig::from_json(r#"{"databasePath": ":memory:", "weightKg": 62.5}"#).unwrap();
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.weight_kg, 62.5);
        assert_eq!(config.display_tick_ms, 1000);
        assert_eq!(config.default_activity, ActivityType::Running);
    }

    #[test]
    fn test_invalid_config() {
        let err = TrackerConfig::from_json(r#"{"displayTickMs": 0}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        assert!(TrackerConfig::from_json(r#"{"weightKg": -3}"#).is_err());
        assert!(TrackerConfig::from_json("not json").is_err());
    }
}
