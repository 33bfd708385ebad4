use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::simulator::{Route, Waypoint};
use crate::utils::geometry::Position;

/// Waypoint entry of a scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Route entry of a scenario file, listing waypoint ids in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub route: Vec<String>,
}

/// On-disk scenario description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub waypoints: Vec<WaypointEntry>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// Waypoints and route templates, in file order
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub name: String,
    pub waypoints: IndexMap<String, Arc<Waypoint>>,
    pub routes: IndexMap<String, Route>,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load<P: AsRef<Path>>(path: P, config: &SimulationConfig) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        let file: ScenarioFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario JSON: {}", path.display()))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let scenario = Self::from_file(name, file, config)
            .with_context(|| format!("Invalid scenario: {}", path.display()))?;
        info!("[SCENARIO] Loaded {}", scenario.statistics().to_string().trim_end());
        Ok(scenario)
    }

    /// Resolve a parsed scenario file into waypoints and routes
    pub fn from_file(name: String, file: ScenarioFile, config: &SimulationConfig) -> SimResult<Self> {
        let mut waypoints = IndexMap::new();
        for entry in file.waypoints {
            if waypoints.contains_key(&entry.id) {
                return Err(SimError::DuplicateId { kind: "waypoint", id: entry.id });
            }
            let waypoint = Waypoint::new(
                entry.id.clone(),
                Position::new(entry.x, entry.y),
                config.waypoint_half_width,
                config.waypoint_half_height,
            );
            waypoints.insert(entry.id, Arc::new(waypoint));
        }

        let mut routes = IndexMap::new();
        for entry in file.routes {
            if routes.contains_key(&entry.id) {
                return Err(SimError::DuplicateId { kind: "route", id: entry.id });
            }
            let resolved = entry
                .route
                .iter()
                .map(|id| {
                    waypoints.get(id).cloned().ok_or_else(|| SimError::UnknownWaypoint {
                        route: entry.id.clone(),
                        waypoint: id.clone(),
                    })
                })
                .collect::<SimResult<Vec<_>>>()?;

            let route = Route::new(entry.id.clone(), resolved)?.with_max_deviation(config.max_deviation);
            routes.insert(entry.id, route);
        }

        Ok(Self { name, waypoints, routes })
    }

    /// Start positions, one per route in route order
    pub fn start_points(&self) -> Vec<Position> {
        self.routes.values().map(|r| r.start().position).collect()
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    pub fn waypoint(&self, name: &str) -> Option<&Arc<Waypoint>> {
        self.waypoints.get(name)
    }

    /// Get statistics about the scenario
    pub fn statistics(&self) -> ScenarioStats {
        ScenarioStats {
            name: self.name.clone(),
            waypoints: self.waypoints.len(),
            routes: self.routes.len(),
            longest_route: self.routes.values().map(|r| r.waypoints().len()).max().unwrap_or(0),
        }
    }
}

/// Statistics about a loaded scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioStats {
    pub name: String,
    pub waypoints: usize,
    pub routes: usize,
    pub longest_route: usize,
}

impl std::fmt::Display for ScenarioStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scenario: {}", self.name)?;
        writeln!(f, "  Waypoints: {}", self.waypoints)?;
        writeln!(f, "  Routes: {} (longest {} waypoints)", self.routes, self.longest_route)?;
        Ok(())
    }
}

/// Builder for creating scenarios programmatically (for testing)
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    name: Option<String>,
    file: ScenarioFile,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn add_waypoint(mut self, id: &str, x: f64, y: f64) -> Self {
        self.file.waypoints.push(WaypointEntry { id: id.to_string(), x, y });
        self
    }

    pub fn add_route(mut self, id: &str, waypoints: &[&str]) -> Self {
        self.file.routes.push(RouteEntry {
            id: id.to_string(),
            route: waypoints.iter().map(|w| w.to_string()).collect(),
        });
        self
    }

    pub fn build(self, config: &SimulationConfig) -> SimResult<Scenario> {
        let name = self.name.unwrap_or_else(|| "Built Scenario".to_string());
        Scenario::from_file(name, self.file, config)
    }
}
