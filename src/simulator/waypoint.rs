use serde::Serialize;

use crate::utils::geometry::{distance_to_segment, point_in_polygon, Position};

/// A named navigation point with a rectangular arrival region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub name: String,
    pub position: Position,
    /// Region corners: top-left, top-right, bottom-right, bottom-left
    pub region: [Position; 4],
}

impl Waypoint {
    pub fn new(name: impl Into<String>, position: Position, half_width: f64, half_height: f64) -> Self {
        let Position { x, y } = position;
        Self {
            name: name.into(),
            position,
            region: [
                Position::new(x - half_width, y - half_height),
                Position::new(x + half_width, y - half_height),
                Position::new(x + half_width, y + half_height),
                Position::new(x - half_width, y + half_height),
            ],
        }
    }

    /// Whether `pos` lies inside the region, edges included.
    pub fn has_reached(&self, pos: &Position) -> bool {
        point_in_polygon(&self.region, pos)
    }

    /// Shortest distance from `pos` to the region outline, rounded to 3 decimals.
    ///
    /// Edges whose perpendicular foot falls outside the edge are ignored;
    /// `None` if no edge applies.
    pub fn dist_from(&self, pos: &Position) -> Option<f64> {
        let n = self.region.len();
        (0..n)
            .filter_map(|i| distance_to_segment(&self.region[i], &self.region[(i + 1) % n], pos))
            .min_by(|a, b| a.total_cmp(b))
            .map(|d| (d * 1000.0).round() / 1000.0)
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.position)
    }
}
