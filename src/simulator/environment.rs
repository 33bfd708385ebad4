use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::plane::{Plane, PlaneSnapshot};
use super::route::Route;
use super::termination::Termination;
use super::waypoint::Waypoint;
use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::scenario::Scenario;
use crate::utils::geometry::{distance, Position};

/// Requests a running [`Environment`] loop to stop from another thread.
///
/// The request is observed at the top of the next loop iteration.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The simulation world: static waypoints and routes, active and terminated aircraft.
pub struct Environment {
    config: SimulationConfig,
    waypoints: IndexMap<String, Arc<Waypoint>>,
    routes: Vec<Route>,
    start_points: Vec<Position>,

    aircraft: IndexMap<String, Plane>,
    terminated: IndexMap<String, Plane>,

    running: bool,
    ran: bool,
    stop: StopHandle,

    rng: ChaCha8Rng,
    tick: u64,
    timer: u64,
    spawned: usize,
    snapshot_tx: Option<watch::Sender<EnvironmentSnapshot>>,
}

impl Environment {
    pub fn new(scenario: &Scenario, config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;

        let routes: Vec<Route> = scenario
            .routes
            .values()
            .map(|r| r.duplicate().with_max_deviation(config.max_deviation))
            .collect();

        let start_points = if routes.is_empty() {
            config.start_points.clone()
        } else {
            scenario.start_points()
        };

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            waypoints: scenario.waypoints.clone(),
            routes,
            start_points,
            aircraft: IndexMap::new(),
            terminated: IndexMap::new(),
            running: false,
            ran: false,
            stop: StopHandle::default(),
            rng,
            tick: 0,
            timer: 0,
            spawned: 0,
            snapshot_tx: None,
            config,
        })
    }

    /// Run until `max_aircraft` have been generated by this call (0 for no
    /// limit) or a stop is requested.
    ///
    /// The spawn schedule and the whole-second timer restart with every call;
    /// callsign numbering continues from earlier runs.
    pub fn run(&mut self, max_aircraft: usize) {
        let points = self.start_points.len();
        self.ran = true;
        self.timer = 0;

        if points == 0 {
            warn!("[ENVIRONMENT] No start points, nothing to simulate");
            self.running = false;
            self.publish_snapshot();
            return;
        }

        let mut next_spawn: Vec<u64> = (0..points).map(|_| self.draw_delay()).collect();

        // Force a random subset to spawn straight away so the scenario does not start empty
        let forced = self.rng.gen_range(1..=points);
        for _ in 0..forced {
            let k = self.rng.gen_range(0..points);
            next_spawn[k] = 0;
        }

        info!(
            "[ENVIRONMENT] Starting run: {} start points, max aircraft {}",
            points,
            if max_aircraft == 0 { "unlimited".to_string() } else { max_aircraft.to_string() }
        );

        let fps = self.config.fps;
        let pacing = Duration::from_secs_f64((1.0 / fps as f64) / self.config.time_scale);
        let mut step = 0u32;
        let mut spawned = 0usize;
        self.running = true;

        while self.running {
            if self.stop.is_stop_requested() {
                info!("[ENVIRONMENT] Stop requested");
                self.running = false;
                continue;
            }

            if max_aircraft > 0 && spawned >= max_aircraft {
                self.running = false;
                continue;
            }

            for (k, spawn_at) in next_spawn.iter_mut().enumerate() {
                if *spawn_at == self.timer {
                    let callsign = format!("{}{}", self.config.prefix, self.spawned);
                    if self.generate_aircraft(k, callsign).is_some() {
                        spawned += 1;
                    }
                    *spawn_at += self.draw_delay();
                }
            }

            if self.config.visual {
                thread::sleep(pacing);
            }

            self.step();

            step = (step + 1) % fps;
            if step == 0 {
                self.timer += 1;
            }
        }

        info!("[ENVIRONMENT] Run finished after {} ticks", self.tick);
        self.publish_snapshot();
    }

    /// One tick: move every active aircraft, then check separation on the
    /// positions from before the move.
    pub fn step(&mut self) {
        let distances = self.distance_matrix();
        let bounds = self.config.area;

        for plane in self.aircraft.values_mut() {
            plane.step(bounds);
        }

        self.check_collisions(&distances, self.config.min_separation);
        self.update_active();
        self.tick += 1;
        if self.tick % self.config.fps as u64 == 0 {
            self.publish_snapshot();
        }
    }

    /// Spawn an aircraft at start point `k`, returning it if it was added.
    ///
    /// With routes loaded the aircraft flies a fresh copy of route `k`;
    /// otherwise it gets a random heading and no route.
    pub fn generate_aircraft(&mut self, k: usize, callsign: String) -> Option<&Plane> {
        let Some(&start) = self.start_points.get(k) else {
            warn!("[ENVIRONMENT] No start point {} for {}", k, callsign);
            return None;
        };
        if self.aircraft.contains_key(&callsign) || self.terminated.contains_key(&callsign) {
            warn!("[ENVIRONMENT] Callsign {} already in use", callsign);
            return None;
        }

        let speed = self.rng.gen_range(self.config.min_speed..=self.config.max_speed) as f64;
        let altitude = self.rng.gen_range(self.config.min_altitude..=self.config.max_altitude) as f64;

        let (heading, route) = match self.routes.get(k) {
            Some(template) => (template.initial_heading(), Some(template.duplicate())),
            None => (self.rng.gen_range(0..360) as f64, None),
        };

        let plane = Plane::new(callsign.clone(), start, speed, altitude, heading, route, &self.config);
        debug!(
            "[ENVIRONMENT] Spawned {} at {} hdg {:03} spd {} alt {}",
            callsign, start, heading as i32, speed, altitude
        );

        self.spawned += 1;
        self.aircraft.insert(callsign.clone(), plane);
        self.aircraft.get(&callsign)
    }

    /// Add an already built aircraft to the active set.
    pub fn add_aircraft(&mut self, plane: Plane) -> bool {
        if self.aircraft.contains_key(&plane.callsign) || self.terminated.contains_key(&plane.callsign) {
            return false;
        }
        self.aircraft.insert(plane.callsign.clone(), plane);
        true
    }

    /// Flag every pair of active aircraft closer than `min_separation`.
    ///
    /// `distances` is indexed like the active map. Eligibility is decided
    /// before any flag is set, so the result does not depend on pair order.
    /// Returns the number of aircraft flagged.
    pub fn check_collisions(&mut self, distances: &[Vec<f64>], min_separation: f64) -> usize {
        let eligible: Vec<bool> = self.aircraft.values().map(|p| p.terminated.is_active()).collect();
        let n = eligible.len().min(distances.len());
        let mut collided = vec![false; n];

        for i in 0..n {
            if !eligible[i] {
                continue;
            }
            for j in (i + 1)..n {
                if eligible[j] && distances[i][j] < min_separation {
                    collided[i] = true;
                    collided[j] = true;
                }
            }
        }

        let mut flagged = 0;
        for (i, _) in collided.iter().enumerate().filter(|(_, hit)| **hit) {
            if let Some((callsign, plane)) = self.aircraft.get_index_mut(i) {
                plane.terminated = Termination::Collision;
                debug!("[ENVIRONMENT] {} lost separation at {}", callsign, plane.position);
                flagged += 1;
            }
        }
        flagged
    }

    /// Move terminated aircraft out of the active set, keeping order.
    pub fn update_active(&mut self) {
        let aircraft = std::mem::take(&mut self.aircraft);

        for (callsign, plane) in aircraft {
            if plane.terminated.is_active() {
                self.aircraft.insert(callsign, plane);
            } else {
                self.terminated.insert(callsign, plane);
            }
        }
    }

    /// Pairwise distances between active aircraft, in active-map order.
    pub fn distance_matrix(&self) -> Vec<Vec<f64>> {
        let positions: Vec<Position> = self.aircraft.values().map(|p| p.position).collect();
        let n = positions.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(&positions[i], &positions[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }
        matrix
    }

    /// True once a run has been started and has ended.
    pub fn is_finished(&self) -> bool {
        self.ran && !self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Receive a snapshot once per simulated second and when a run ends
    pub fn subscribe(&mut self) -> watch::Receiver<EnvironmentSnapshot> {
        if let Some(tx) = &self.snapshot_tx {
            return tx.subscribe();
        }

        let (tx, rx) = watch::channel(self.snapshot());
        self.snapshot_tx = Some(tx);
        rx
    }

    fn publish_snapshot(&self) {
        if let Some(tx) = &self.snapshot_tx {
            tx.send_replace(self.snapshot());
        }
    }

    fn draw_delay(&mut self) -> u64 {
        self.config.delays.choose(&mut self.rng).copied().unwrap_or(0)
    }

    pub fn aircraft(&self) -> &IndexMap<String, Plane> {
        &self.aircraft
    }

    pub fn terminated(&self) -> &IndexMap<String, Plane> {
        &self.terminated
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn waypoints(&self) -> &IndexMap<String, Arc<Waypoint>> {
        &self.waypoints
    }

    pub fn start_points(&self) -> &[Position] {
        &self.start_points
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whole simulated seconds elapsed in `run`
    pub fn timer(&self) -> u64 {
        self.timer
    }

    /// Everything a renderer needs to draw the current state.
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let skip = self.terminated.len().saturating_sub(self.config.max_terminated_display);

        EnvironmentSnapshot {
            tick: self.tick,
            timer: self.timer,
            finished: self.is_finished(),
            area: self.config.area,
            aircraft: self.aircraft.values().map(Plane::snapshot).collect(),
            terminated: self.terminated.values().skip(skip).map(Plane::snapshot).collect(),
            waypoints: self.waypoints.values().map(|w| w.as_ref().clone()).collect(),
            routes: self
                .routes
                .iter()
                .map(|r| RouteSnapshot {
                    name: r.name.clone(),
                    points: r.points(),
                })
                .collect(),
        }
    }

    pub fn statistics(&self) -> EnvironmentStats {
        let count = |t: Termination| self.terminated.values().filter(|p| p.terminated == t).count();

        EnvironmentStats {
            tick: self.tick,
            timer: self.timer,
            spawned: self.spawned,
            active: self.aircraft.len(),
            safe: count(Termination::Safe),
            out_of_bounds: count(Termination::OutOfBounds),
            collisions: count(Termination::Collision),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSnapshot {
    pub name: String,
    pub points: Vec<Position>,
}

/// Immutable copy of the environment taken at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSnapshot {
    pub tick: u64,
    pub timer: u64,
    pub finished: bool,
    pub area: (f64, f64),
    pub aircraft: Vec<PlaneSnapshot>,
    /// Most recently terminated aircraft, oldest first
    pub terminated: Vec<PlaneSnapshot>,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<RouteSnapshot>,
}

/// Statistics about a simulation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentStats {
    pub tick: u64,
    pub timer: u64,
    pub spawned: usize,
    pub active: usize,
    pub safe: usize,
    pub out_of_bounds: usize,
    pub collisions: usize,
}

impl std::fmt::Display for EnvironmentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Environment Status:")?;
        writeln!(f, "  Ticks: {} ({}s simulated)", self.tick, self.timer)?;
        writeln!(f, "  Aircraft Spawned: {}", self.spawned)?;
        writeln!(f, "  Active: {}", self.active)?;
        writeln!(f, "  Arrived Safely: {}", self.safe)?;
        writeln!(f, "  Out of Bounds: {}", self.out_of_bounds)?;
        writeln!(f, "  Collisions: {}", self.collisions)?;
        Ok(())
    }
}
