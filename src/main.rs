use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use volume_sim_rust::config::SimulationConfig;
use volume_sim_rust::scenario::Scenario;
use volume_sim_rust::simulation::Simulator;

#[derive(Parser)]
#[command(name = "volume-sim")]
#[command(about = "Headless airspace volume simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long)]
        scenario: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many aircraft have been generated (0 runs until Ctrl-C)
        #[arg(short, long, default_value = "0")]
        max_aircraft: usize,

        /// Pace the simulation in real time
        #[arg(long)]
        visual: bool,
    },

    Inspect {
        #[arg(short, long)]
        scenario: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::load(path),
        None => Ok(SimulationConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            seed,
            max_aircraft,
            visual,
        } => {
            let mut config = load_config(config.as_ref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            config.visual |= visual;

            let scenario = Scenario::load(&scenario, &config)?;
            let simulator = Simulator::new(&scenario, config)?;

            let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
            ctrlc::set_handler(move || {
                let _ = shutdown_tx.send(());
            })?;

            info!("Starting simulation of {}", scenario.name);
            let stats = simulator.run(max_aircraft, shutdown_rx).await?;
            println!("{}", stats);
        }

        Commands::Inspect { scenario, config } => {
            let config = load_config(config.as_ref())?;
            let scenario = Scenario::load(&scenario, &config)?;

            print!("{}", scenario.statistics());
            for route in scenario.routes.values() {
                println!("  {} (initial heading {:03})", route, route.initial_heading() as i32);
            }
        }
    }

    Ok(())
}
