mod plane;
mod route;
mod termination;
mod waypoint;
pub mod environment;

pub use environment::{Environment, EnvironmentSnapshot, EnvironmentStats, RouteSnapshot, StopHandle};
pub use plane::{Plane, PlaneSnapshot};
pub use route::{Route, RouteStatus};
pub use termination::Termination;
pub use waypoint::Waypoint;
