use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::scenario::Scenario;
use crate::simulator::{Environment, EnvironmentSnapshot, EnvironmentStats};

/// Drives an [`Environment`] on a blocking task while a display loop reads
/// its snapshots.
pub struct Simulator {
    environment: Environment,
    snapshots: watch::Receiver<EnvironmentSnapshot>,
    fps: u32,
}

impl Simulator {
    pub fn new(scenario: &Scenario, config: SimulationConfig) -> Result<Self> {
        let fps = config.fps;
        let mut environment = Environment::new(scenario, config).context("Failed to build environment")?;
        let snapshots = environment.subscribe();

        Ok(Self {
            environment,
            snapshots,
            fps,
        })
    }

    /// Handle for reading snapshots while the simulation runs
    pub fn snapshots(&self) -> watch::Receiver<EnvironmentSnapshot> {
        self.snapshots.clone()
    }

    /// Run until `max_aircraft` have spawned (0 for no limit) or shutdown is signalled.
    pub async fn run(self, max_aircraft: usize, shutdown: broadcast::Receiver<()>) -> Result<SimulatorStats> {
        let Self {
            mut environment,
            mut snapshots,
            fps,
        } = self;

        let started_at = Utc::now();
        let stop = environment.stop_handle();
        info!("[SIMULATOR] Starting simulation loop...");

        let mut sim_task = tokio::task::spawn_blocking(move || {
            environment.run(max_aircraft);
            environment
        });

        let mut display_interval = interval(Duration::from_secs_f64(1.0 / fps as f64));
        let mut shutdown_rx = shutdown;
        let mut shutdown_open = true;
        let mut frames = 0u64;

        let environment = loop {
            tokio::select! {
                result = &mut sim_task => {
                    break result.context("Simulation task failed")?;
                }
                signal = shutdown_rx.recv(), if shutdown_open => match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        info!("[SIMULATOR] Shutdown signal received");
                        stop.stop();
                        break (&mut sim_task).await.context("Simulation task failed")?;
                    }
                    Err(RecvError::Closed) => {
                        debug!("[SIMULATOR] Shutdown channel closed, running to completion");
                        shutdown_open = false;
                    }
                },
                _ = display_interval.tick() => {
                    frames += 1;
                    if frames % fps as u64 == 0 {
                        let snapshot = snapshots.borrow_and_update().clone();
                        Self::log_radar(&snapshot);
                    }
                }
            }
        };

        let stats = SimulatorStats {
            started_at,
            finished_at: Utc::now(),
            environment: environment.statistics(),
        };
        info!("[SIMULATOR] Simulation loop stopped");
        Ok(stats)
    }

    fn log_radar(snapshot: &EnvironmentSnapshot) {
        debug!(
            "[SIMULATOR] t={}s: {} active, {} recently terminated",
            snapshot.timer,
            snapshot.aircraft.len(),
            snapshot.terminated.len()
        );
        for plane in &snapshot.aircraft {
            debug!(
                "{}: {} hdg {:03} {} m/s {} m",
                plane.callsign, plane.position, plane.heading as i32, plane.speed, plane.altitude
            );
        }
    }
}

/// Statistics about a finished simulator run
#[derive(Debug, Clone)]
pub struct SimulatorStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub environment: EnvironmentStats,
}

impl std::fmt::Display for SimulatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Simulator Run:")?;
        writeln!(f, "  Started: {}", self.started_at.to_rfc3339())?;
        writeln!(
            f,
            "  Wall time: {:.3}s",
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
        )?;
        write!(f, "{}", self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioBuilder;

    fn scenario() -> Scenario {
        ScenarioBuilder::new()
            .add_waypoint("A", 100.0, 400.0)
            .add_waypoint("B", 700.0, 400.0)
            .add_route("AB", &["A", "B"])
            .build(&SimulationConfig::default())
            .unwrap()
    }

    #[tokio::test]
    async fn test_runs_to_max_aircraft() -> Result<()> {
        let config = SimulationConfig {
            seed: Some(3),
            ..Default::default()
        };
        let simulator = Simulator::new(&scenario(), config)?;
        let snapshots = simulator.snapshots();
        let (_tx, rx) = broadcast::channel(1);

        let stats = simulator.run(2, rx).await?;
        assert!(stats.environment.spawned >= 2);
        assert!(snapshots.borrow().finished);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_stops_unbounded_run() -> Result<()> {
        let config = SimulationConfig {
            seed: Some(3),
            visual: true,
            fps: 200,
            ..Default::default()
        };
        let simulator = Simulator::new(&scenario(), config)?;
        let snapshots = simulator.snapshots();
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(simulator.run(0, rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(())?;

        let stats = handle.await??;
        assert!(stats.finished_at >= stats.started_at);
        assert!(snapshots.borrow().finished);
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_does_not_stop_run() -> Result<()> {
        let config = SimulationConfig {
            seed: Some(3),
            fps: 4,
            delays: vec![1],
            ..Default::default()
        };
        let simulator = Simulator::new(&scenario(), config)?;
        let (tx, rx) = broadcast::channel::<()>(1);
        drop(tx);

        let stats = simulator.run(5, rx).await?;
        assert!(stats.environment.spawned >= 5);
        Ok(())
    }
}
