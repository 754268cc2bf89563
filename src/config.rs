//! Configuration for the signal simulation

use crate::control_system::{CrossingTiming, LightTiming};
use crate::error::SimulationError;
use crate::global_variables::{
    DEFAULT_PEDESTRIAN_CROSSINGS, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TRAFFIC_LIGHTS,
    MANUAL_OVERRIDE_TICKS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the controller does with an unknown pedestrian mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidModePolicy {
    /// Log a warning and carry on.
    Ignore,
    /// Return `SimulationError::InvalidModeValue` to the caller.
    #[default]
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of one tick in milliseconds (default: 1000)
    pub tick_interval_ms: u64,

    /// Location names of the traffic lights
    pub traffic_lights: Vec<String>,

    /// Location names of the pedestrian crossings
    pub pedestrian_crossings: Vec<String>,

    pub light: LightTiming,

    pub crossing: CrossingTiming,

    /// Green duration forced by a manual override, in ticks
    pub manual_override_ticks: u32,

    pub invalid_mode_policy: InvalidModePolicy,

    /// Seed for reproducible runs; thread-local randomness when absent
    pub seed: Option<u64>,

    /// Hour of day used for peak detection instead of the local clock
    pub current_hour: Option<u32>,

    /// Directory for the append-only CSV logs; no file logging when absent
    pub log_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            traffic_lights: DEFAULT_TRAFFIC_LIGHTS.iter().map(|s| s.to_string()).collect(),
            pedestrian_crossings: DEFAULT_PEDESTRIAN_CROSSINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            light: LightTiming::default(),
            crossing: CrossingTiming::default(),
            manual_override_ticks: MANUAL_OVERRIDE_TICKS,
            invalid_mode_policy: InvalidModePolicy::default(),
            seed: None,
            current_hour: None,
            log_dir: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tick_interval_ms == 0 {
            return Err(SimulationError::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.traffic_lights.is_empty() && self.pedestrian_crossings.is_empty() {
            return Err(SimulationError::Config(
                "at least one traffic light or pedestrian crossing is required".to_string(),
            ));
        }
        self.light.validate()?;
        if let Some(hour) = self.current_hour {
            if hour > 23 {
                return Err(SimulationError::Config(format!(
                    "current_hour must be within 0..=23, got {}",
                    hour
                )));
            }
        }
        let mut names: Vec<&String> = self
            .traffic_lights
            .iter()
            .chain(self.pedestrian_crossings.iter())
            .collect();
        names.sort();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SimulationError::Config(format!(
                "duplicate location '{}'",
                pair[0]
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = SimulationConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.light.min_green_time, 5);
        assert_eq!(config.light.max_green_time, 10);
        assert_eq!(config.light.peak_hours, (7, 9));
        assert_eq!(config.crossing.crossing_duration, 10);
        assert_eq!(config.crossing.waiting_duration, 5);
        assert_eq!(config.manual_override_ticks, 5);
        assert_eq!(config.invalid_mode_policy, InvalidModePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let json = r#"{
            "tick_interval_ms": 250,
            "traffic_lights": ["Oak Road"],
            "light": { "min_green_time": 2 },
            "invalid_mode_policy": "ignore",
            "seed": 9
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.traffic_lights, vec!["Oak Road".to_string()]);
        assert_eq!(config.pedestrian_crossings.len(), 2);
        assert_eq!(config.light.min_green_time, 2);
        assert_eq!(config.light.max_green_time, 10);
        assert_eq!(config.invalid_mode_policy, InvalidModePolicy::Ignore);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simulation.json");
        let mut config = SimulationConfig::default();
        config.current_hour = Some(8);
        config.to_file(&path).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        // 1/11 has no short decimal form and must come back bit for bit
        assert_eq!(
            loaded.light.emergency_probability.to_bits(),
            (1.0f64 / 11.0).to_bits()
        );
        assert_eq!(loaded, config);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.light.min_green_time = 11;
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));

        let mut config = SimulationConfig::default();
        config.light.emergency_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.pedestrian_crossings = vec!["Main Street".to_string()];
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.traffic_lights.clear();
        config.pedestrian_crossings.clear();
        assert!(config.validate().is_err());
    }
}
