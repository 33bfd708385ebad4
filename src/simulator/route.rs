use std::sync::Arc;
use tracing::debug;

use super::waypoint::Waypoint;
use crate::error::{SimError, SimResult};
use crate::utils::geometry::{bearing, distance_to_segment, Position};

/// Outcome of checking a position against a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    OnTrack,
    Arrived,
    OffCourse,
}

/// An ordered sequence of waypoints with a cursor on the waypoint being flown to.
///
/// The waypoint list is never consumed; `next` indexes into it, so the
/// previous waypoint is always `next - 1`.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    waypoints: Vec<Arc<Waypoint>>,
    next: usize,
    max_deviation: Option<f64>,
    initial_heading: f64,
}

impl Route {
    pub fn new(name: impl Into<String>, waypoints: Vec<Arc<Waypoint>>) -> SimResult<Self> {
        let name = name.into();
        if waypoints.len() < 2 {
            return Err(SimError::InvalidRoute {
                route: name,
                waypoints: waypoints.len(),
            });
        }

        let initial_heading = bearing(&waypoints[0].position, &waypoints[1].position).trunc();

        Ok(Self {
            name,
            waypoints,
            next: 1,
            max_deviation: None,
            initial_heading,
        })
    }

    /// Enable corridor deviation checks. `None` disables them.
    pub fn with_max_deviation(mut self, max_deviation: Option<f64>) -> Self {
        self.max_deviation = max_deviation;
        self
    }

    /// A fresh copy of this route with its cursor back at the start.
    pub fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            waypoints: self.waypoints.clone(),
            next: 1,
            max_deviation: self.max_deviation,
            initial_heading: self.initial_heading,
        }
    }

    /// Advance the cursor if `pos` reached the next waypoint, then check the corridor.
    pub fn update(&mut self, pos: &Position) -> RouteStatus {
        if self.next_waypoint().has_reached(pos) {
            if self.remaining().is_empty() {
                return RouteStatus::Arrived;
            }

            self.next += 1;
            debug!(
                "[ROUTE] {} passed {}, now routing to {}",
                self.name,
                self.previous_waypoint().name,
                self.next_waypoint().name
            );
        }

        if let Some(max_deviation) = self.max_deviation {
            let deviation = distance_to_segment(
                &self.previous_waypoint().position,
                &self.next_waypoint().position,
                pos,
            );
            if deviation.is_some_and(|d| d > max_deviation) {
                return RouteStatus::OffCourse;
            }
        }

        RouteStatus::OnTrack
    }

    pub fn start(&self) -> &Arc<Waypoint> {
        &self.waypoints[0]
    }

    pub fn previous_waypoint(&self) -> &Arc<Waypoint> {
        &self.waypoints[self.next - 1]
    }

    pub fn next_waypoint(&self) -> &Arc<Waypoint> {
        &self.waypoints[self.next]
    }

    /// Waypoints still to be flown after the next one
    pub fn remaining(&self) -> &[Arc<Waypoint>] {
        &self.waypoints[self.next + 1..]
    }

    pub fn waypoints(&self) -> &[Arc<Waypoint>] {
        &self.waypoints
    }

    pub fn points(&self) -> Vec<Position> {
        self.waypoints.iter().map(|w| w.position).collect()
    }

    /// Bearing from the start to the second waypoint, truncated to whole degrees.
    pub fn initial_heading(&self) -> f64 {
        self.initial_heading
    }

    pub fn max_deviation(&self) -> Option<f64> {
        self.max_deviation
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.waypoints.iter().map(|w| w.name.as_str()).collect();
        write!(f, "{}: {}", self.name, names.join(" "))
    }
}
