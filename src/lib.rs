pub mod config;
pub mod error;
pub mod scenario;
pub mod simulation;
pub mod simulator;
pub mod utils;

pub use config::SimulationConfig;
pub use error::SimError;
pub use scenario::Scenario;
pub use simulator::{Environment, Plane, Route, RouteStatus, Termination, Waypoint};
