use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

use super::route::{Route, RouteStatus};
use super::termination::Termination;
use crate::config::SimulationConfig;
use crate::utils::geometry::{heading_to_radians, normalize_heading, Position};

/// A simulated aircraft flying a constant heading at constant speed.
#[derive(Debug, Clone)]
pub struct Plane {
    pub callsign: String,

    // Position and movement
    pub position: Position,
    pub speed: f64,         // distance per tick, before world scaling
    pub tas: f64,           // generated speed as displayed
    pub altitude: f64,      // meters
    pub heading: f64,       // negated compass heading, 0-360

    pub route: Option<Route>,
    pub terminated: Termination,

    scale: f64,
    path: VecDeque<Position>,
    path_limit: usize,
    sample_interval: u64,
    updates: u64,
}

/// Read-only view of a plane for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneSnapshot {
    pub callsign: String,
    pub position: Position,
    pub heading: f64,
    pub speed: f64,
    pub altitude: f64,
    pub route: Option<String>,
    pub terminated: Termination,
    pub path: Vec<Position>,
}

impl Plane {
    pub fn new(
        callsign: String,
        start: Position,
        speed: f64,
        altitude: f64,
        heading: f64,
        route: Option<Route>,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            callsign,
            position: start,
            speed: Self::tick_speed(speed, config.max_speed_clamp, config.scale),
            tas: speed,
            altitude,
            heading: normalize_heading(-heading),
            route,
            terminated: Termination::Active,
            scale: config.scale,
            path: VecDeque::new(),
            path_limit: config.path_limit,
            sample_interval: config.path_sample_interval.max(1),
            updates: 0,
        }
    }

    /// Clamp, scale, then convert from per-minute to per-tick distance.
    fn tick_speed(speed: f64, clamp: f64, scale: f64) -> f64 {
        (speed.min(clamp) / scale) / 60.0
    }

    /// Advance one tick inside an area of `bounds` (width, height).
    ///
    /// A terminated plane is left untouched.
    pub fn step(&mut self, bounds: (f64, f64)) {
        if self.terminated.is_terminated() {
            return;
        }

        self.update_position();

        if self.updates % self.sample_interval == 0 {
            self.record_path_point();
        }

        if let Some(route) = self.route.as_mut() {
            self.terminated = match route.update(&self.position) {
                RouteStatus::OnTrack => Termination::Active,
                RouteStatus::Arrived => Termination::Safe,
                RouteStatus::OffCourse => Termination::OutOfBounds,
            };
        }

        if self.terminated.is_active() && !self.in_world(bounds) {
            self.terminated = Termination::OutOfBounds;
        }

        self.updates += 1;

        if self.terminated.is_terminated() {
            debug!("[PLANE] {} terminated: {} at {}", self.callsign, self.terminated, self.position);
        }
    }

    fn update_position(&mut self) {
        let heading = heading_to_radians(self.heading);
        self.position.advance(heading, self.speed / self.scale);
    }

    fn record_path_point(&mut self) {
        if self.path_limit == 0 {
            return;
        }
        while self.path.len() >= self.path_limit {
            self.path.pop_front();
        }
        self.path.push_back(self.position);
    }

    pub fn in_world(&self, bounds: (f64, f64)) -> bool {
        (0.0..=bounds.0).contains(&self.position.x) && (0.0..=bounds.1).contains(&self.position.y)
    }

    /// Compass heading, clockwise from north
    pub fn display_heading(&self) -> f64 {
        normalize_heading(-self.heading)
    }

    pub fn path(&self) -> impl Iterator<Item = &Position> {
        self.path.iter()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn snapshot(&self) -> PlaneSnapshot {
        PlaneSnapshot {
            callsign: self.callsign.clone(),
            position: self.position,
            heading: self.display_heading(),
            speed: self.tas,
            altitude: self.altitude,
            route: self.route.as_ref().map(|r| r.name.clone()),
            terminated: self.terminated,
            path: self.path.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::waypoint::Waypoint;
    use std::sync::Arc;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn east_route() -> Route {
        let a = Arc::new(Waypoint::new("A", Position::new(0.0, 50.0), 10.0, 10.0));
        let b = Arc::new(Waypoint::new("B", Position::new(100.0, 50.0), 10.0, 10.0));
        Route::new("EAST", vec![a, b]).unwrap()
    }

    #[test]
    fn test_speed_conversion() {
        let mut cfg = config();
        cfg.scale = 2.0;

        let plane = Plane::new("AC0".into(), Position::new(0.0, 0.0), 60.0, 100.0, 0.0, None, &cfg);
        // min(45, 60) / 2 / 60
        assert!((plane.speed - 0.375).abs() < 1e-12);
        assert_eq!(plane.tas, 60.0);
    }

    #[test]
    fn test_moves_along_heading() {
        let plane_at = |heading: f64| {
            let mut p = Plane::new("AC0".into(), Position::new(400.0, 400.0), 30.0, 100.0, heading, None, &config());
            p.step((800.0, 800.0));
            p.position
        };

        let east = plane_at(90.0);
        assert!((east.x - 400.5).abs() < 1e-9);
        assert!((east.y - 400.0).abs() < 1e-9);

        let north = plane_at(0.0);
        assert!((north.x - 400.0).abs() < 1e-9);
        assert!((north.y - 399.5).abs() < 1e-9);
    }

    #[test]
    fn test_display_heading_round_trip() {
        let plane = Plane::new("AC0".into(), Position::new(0.0, 0.0), 30.0, 100.0, 123.0, None, &config());
        assert_eq!(plane.heading, 237.0);
        assert_eq!(plane.display_heading(), 123.0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut plane = Plane::new("AC0".into(), Position::new(0.1, 10.0), 30.0, 100.0, 270.0, None, &config());
        plane.step((800.0, 800.0));
        assert_eq!(plane.terminated, Termination::OutOfBounds);
    }

    #[test]
    fn test_terminated_step_is_noop() {
        let mut plane = Plane::new("AC0".into(), Position::new(0.1, 10.0), 30.0, 100.0, 270.0, None, &config());
        plane.step((800.0, 800.0));
        let position = plane.position;
        let updates = plane.updates();

        plane.step((800.0, 800.0));
        assert_eq!(plane.position, position);
        assert_eq!(plane.updates(), updates);
        assert_eq!(plane.terminated, Termination::OutOfBounds);
    }

    #[test]
    fn test_arrives_safely() {
        let route = east_route();
        let heading = route.initial_heading();
        let mut plane = Plane::new("AC0".into(), route.start().position, 45.0, 100.0, heading, Some(route), &config());

        let mut ticks = 0;
        while plane.terminated.is_active() && ticks < 10_000 {
            plane.step((800.0, 800.0));
            ticks += 1;
        }

        assert_eq!(plane.terminated, Termination::Safe);
        assert!(plane.position.x >= 90.0);
    }

    #[test]
    fn test_path_sampling() {
        let mut cfg = config();
        cfg.path_sample_interval = 3;
        cfg.path_limit = 2;

        let mut plane = Plane::new("AC0".into(), Position::new(400.0, 400.0), 30.0, 100.0, 90.0, None, &cfg);
        for _ in 0..7 {
            plane.step((800.0, 800.0));
        }

        // Sampled at updates 0, 3 and 6; only the last two are kept
        let xs: Vec<f64> = plane.path().map(|p| p.x).collect();
        assert_eq!(xs.len(), 2);
        assert!((xs[0] - 402.0).abs() < 1e-9);
        assert!((xs[1] - 403.5).abs() < 1e-9);
    }
}
