use thiserror::Error;

/// Errors raised while building a scenario or environment.
///
/// Runtime outcomes (arrival, leaving the area, collisions) are not errors;
/// they are recorded as [`Termination`](crate::simulator::Termination) codes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("route {route} has {waypoints} waypoint(s), at least 2 are required")]
    InvalidRoute { route: String, waypoints: usize },

    #[error("route {route} references unknown waypoint {waypoint}")]
    UnknownWaypoint { route: String, waypoint: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
