use serde::Serialize;
use std::fmt;

/// Why an aircraft stopped being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Termination {
    #[default]
    Active,
    /// Reached the final waypoint of its route
    Safe,
    /// Left the simulation area or deviated from its corridor
    OutOfBounds,
    /// Lost separation with another aircraft
    Collision,
}

impl Termination {
    pub fn code(&self) -> u8 {
        match self {
            Termination::Active => 0,
            Termination::Safe => 1,
            Termination::OutOfBounds => 2,
            Termination::Collision => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Termination::Active),
            1 => Some(Termination::Safe),
            2 => Some(Termination::OutOfBounds),
            3 => Some(Termination::Collision),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Termination::Active)
    }

    pub fn is_terminated(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Active => write!(f, "ACTIVE"),
            Termination::Safe => write!(f, "SAFE"),
            Termination::OutOfBounds => write!(f, "OUT_OF_BOUNDS"),
            Termination::Collision => write!(f, "COLLISION"),
        }
    }
}
