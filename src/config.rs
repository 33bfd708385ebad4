use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{SimError, SimResult};
use crate::utils::geometry::Position;

/// Simulation parameters, loadable from JSON. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Width and height of the simulation area in meters
    pub area: (f64, f64),
    /// Pace the loop in real time for a renderer
    pub visual: bool,
    /// Ticks per simulated second
    pub fps: u32,
    /// World distance scale
    pub scale: f64,
    /// Real-time pacing multiplier
    pub time_scale: f64,

    // Aircraft generation
    pub min_speed: u32,
    pub max_speed: u32,
    pub min_altitude: u32,
    pub max_altitude: u32,
    pub max_speed_clamp: f64,
    pub prefix: String,
    /// Candidate delays in seconds between spawns on one start point
    pub delays: Vec<u64>,
    /// Spawn points used when the scenario has no routes
    pub start_points: Vec<Position>,
    pub seed: Option<u64>,

    // Safety
    pub min_separation: f64,
    /// Allowed distance from the current route leg; `None` disables the check
    pub max_deviation: Option<f64>,

    // Waypoints
    pub waypoint_half_width: f64,
    pub waypoint_half_height: f64,

    // Display
    pub path_sample_interval: u64,
    pub path_limit: usize,
    pub max_terminated_display: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            area: (800.0, 800.0),
            visual: false,
            fps: 60,
            scale: 1.0,
            time_scale: 1.0,
            min_speed: 15,
            max_speed: 40,
            min_altitude: 100,
            max_altitude: 100,
            max_speed_clamp: 45.0,
            prefix: "AC".to_string(),
            delays: vec![9, 12, 15],
            start_points: Vec::new(),
            seed: None,
            min_separation: 25.0,
            max_deviation: None,
            waypoint_half_width: 25.0,
            waypoint_half_height: 50.0,
            path_sample_interval: 18,
            path_limit: 1000,
            max_terminated_display: 100,
        }
    }
}

impl SimulationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: SimulationConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));

        if self.area.0 <= 0.0 || self.area.1 <= 0.0 {
            return invalid(format!("area must be positive, got {:?}", self.area));
        }
        if self.fps == 0 {
            return invalid("fps must be at least 1".to_string());
        }
        if self.scale <= 0.0 || self.time_scale <= 0.0 {
            return invalid("scale and time scale must be positive".to_string());
        }
        if self.min_speed > self.max_speed {
            return invalid(format!("speed range {}..={} is empty", self.min_speed, self.max_speed));
        }
        if self.min_altitude > self.max_altitude {
            return invalid(format!(
                "altitude range {}..={} is empty",
                self.min_altitude, self.max_altitude
            ));
        }
        if self.delays.is_empty() {
            return invalid("at least one spawn delay is required".to_string());
        }
        if self.path_sample_interval == 0 {
            return invalid("path sample interval must be at least 1".to_string());
        }
        if self.max_deviation.is_some_and(|d| d < 0.0) {
            return invalid("max deviation must not be negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json() -> Result<()> {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"area": [400, 300], "minSeparation": 10, "maxDeviation": 40, "delays": [5]}"#,
        )?;

        assert_eq!(config.area, (400.0, 300.0));
        assert_eq!(config.min_separation, 10.0);
        assert_eq!(config.max_deviation, Some(40.0));
        assert_eq!(config.delays, vec![5]);
        assert_eq!(config.fps, 60);
        assert_eq!(config.prefix, "AC");
        Ok(())
    }

    #[test]
    fn test_validation() {
        let mut config = SimulationConfig::default();
        config.delays.clear();
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.min_speed = 50;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.fps = 0;
        assert!(config.validate().is_err());
    }
}
