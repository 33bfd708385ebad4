//! Planar geometry for the simulation area.
//!
//! Coordinates are screen-like: x grows to the right, y grows downwards, so
//! "north" (heading 0) points towards decreasing y.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Tolerance used when deciding whether a point lies on a polygon edge.
const EDGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Move by `distance` along `heading`, given in trigonometric radians.
    pub fn advance(&mut self, heading: f64, distance: f64) {
        self.x += distance * heading.cos();
        self.y += distance * heading.sin();
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

pub fn distance(p1: &Position, p2: &Position) -> f64 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}

/// Bearing from `p1` to `p2` in degrees [0, 360), clockwise from north.
pub fn bearing(p1: &Position, p2: &Position) -> f64 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;

    normalize_heading(-(dx.atan2(dy).to_degrees() + 180.0))
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
///
/// Returns `None` when the foot of the perpendicular falls outside the
/// segment's bounding box, or when `a` and `b` coincide.
pub fn distance_to_segment(a: &Position, b: &Position, p: &Position) -> Option<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let det = dx * dx + dy * dy;

    if det == 0.0 {
        return None;
    }

    let t = (dy * (p.y - a.y) + dx * (p.x - a.x)) / det;
    let foot = Position::new(a.x + t * dx, a.y + t * dy);

    let within_x = a.x.min(b.x) <= foot.x && foot.x <= a.x.max(b.x);
    let within_y = a.y.min(b.y) <= foot.y && foot.y <= a.y.max(b.y);
    if !within_x || !within_y {
        return None;
    }

    Some(distance(&foot, p))
}

/// Containment test for a simple polygon. Points on an edge count as inside.
pub fn point_in_polygon(vertices: &[Position], p: &Position) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let (vi, vj) = (&vertices[i], &vertices[j]);

        if on_edge(vj, vi, p) {
            return true;
        }

        if (vi.y > p.y) != (vj.y > p.y) {
            let crossing_x = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
            if p.x < crossing_x {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

fn on_edge(a: &Position, b: &Position, p: &Position) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }

    a.x.min(b.x) - EDGE_EPSILON <= p.x
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && a.y.min(b.y) - EDGE_EPSILON <= p.y
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}

/// Normalize heading to the [0, 360) range
pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Convert a stored aircraft heading into the radian angle used by
/// [`Position::advance`].
pub fn heading_to_radians(stored_heading: f64) -> f64 {
    let sim_heading = (stored_heading - 180.0).rem_euclid(360.0);
    FRAC_PI_2 - sim_heading.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, half: f64) -> Vec<Position> {
        vec![
            Position::new(cx - half, cy - half),
            Position::new(cx + half, cy - half),
            Position::new(cx + half, cy + half),
            Position::new(cx - half, cy + half),
        ]
    }

    #[test]
    fn test_distance() {
        let d = distance(&Position::new(0.0, 0.0), &Position::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
        assert_eq!(distance(&Position::new(2.0, 2.0), &Position::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_bearing() {
        let origin = Position::new(0.0, 0.0);

        // North is towards decreasing y
        assert!((bearing(&origin, &Position::new(0.0, -10.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(&origin, &Position::new(10.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(&origin, &Position::new(0.0, 10.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(&origin, &Position::new(-10.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_advance_follows_bearing() {
        let start = Position::new(100.0, 100.0);
        let target = Position::new(160.0, 20.0);
        let hdg = bearing(&start, &target);

        // Stored aircraft headings are the negated compass heading
        let mut p = start;
        p.advance(heading_to_radians(normalize_heading(-hdg)), distance(&start, &target));

        assert!((p.x - target.x).abs() < 1e-6);
        assert!((p.y - target.y).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(100.0, 0.0);

        let d = distance_to_segment(&a, &b, &Position::new(50.0, 7.0));
        assert_eq!(d, Some(7.0));

        // Foot beyond either end is not applicable
        assert_eq!(distance_to_segment(&a, &b, &Position::new(120.0, 3.0)), None);
        assert_eq!(distance_to_segment(&a, &b, &Position::new(-1.0, 3.0)), None);

        // Degenerate segment
        assert_eq!(distance_to_segment(&a, &a, &Position::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_point_in_polygon() {
        let region = square(100.0, 0.0, 10.0);

        assert!(point_in_polygon(&region, &Position::new(99.0, 1.0)));
        assert!(point_in_polygon(&region, &Position::new(110.0, 0.0)));
        assert!(point_in_polygon(&region, &Position::new(90.0, -10.0)));
        assert!(!point_in_polygon(&region, &Position::new(110.001, 0.0)));
        assert!(!point_in_polygon(&region, &Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(725.0), 5.0);
    }
}
