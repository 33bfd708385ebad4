use std::sync::Arc;
use volume_sim_rust::simulator::{Route, RouteStatus, Waypoint};
use volume_sim_rust::utils::geometry::Position;

fn wpt(name: &str, x: f64, y: f64) -> Arc<Waypoint> {
    // 10 unit square around each point
    Arc::new(Waypoint::new(name, Position::new(x, y), 5.0, 5.0))
}

fn a_to_b() -> Route {
    Route::new("AB", vec![wpt("A", 0.0, 0.0), wpt("B", 100.0, 0.0)]).unwrap()
}

#[test]
fn test_arrival_inside_final_region() {
    let mut route = a_to_b();
    assert_eq!(route.update(&Position::new(99.0, 1.0)), RouteStatus::Arrived);
    assert_eq!(route.next_waypoint().name, "B");
}

#[test]
fn test_arrival_boundary_is_inclusive() {
    for edge in [
        Position::new(95.0, 0.0),
        Position::new(105.0, 0.0),
        Position::new(100.0, -5.0),
        Position::new(100.0, 5.0),
        Position::new(105.0, 5.0),
    ] {
        let mut route = a_to_b();
        assert_eq!(route.update(&edge), RouteStatus::Arrived, "edge point {}", edge);
    }

    for outside in [Position::new(94.9, 0.0), Position::new(100.0, 5.1)] {
        let mut route = a_to_b();
        assert_eq!(route.update(&outside), RouteStatus::OnTrack, "outside point {}", outside);
    }
}

#[test]
fn test_copies_are_independent() {
    let template = Route::new(
        "ABC",
        vec![wpt("A", 0.0, 0.0), wpt("B", 100.0, 0.0), wpt("C", 200.0, 0.0)],
    )
    .unwrap();

    let mut first = template.duplicate();
    let second = template.duplicate();

    assert_eq!(first.update(&Position::new(100.0, 0.0)), RouteStatus::OnTrack);
    assert_eq!(first.next_waypoint().name, "C");
    assert_eq!(first.previous_waypoint().name, "B");

    assert_eq!(second.next_waypoint().name, "B");
    assert_eq!(second.previous_waypoint().name, "A");
    assert_eq!(template.next_waypoint().name, "B");
}

#[test]
fn test_corridor_after_advance() {
    let mut route = Route::new(
        "L",
        vec![wpt("A", 0.0, 0.0), wpt("B", 100.0, 0.0), wpt("C", 100.0, 100.0)],
    )
    .unwrap()
    .with_max_deviation(Some(10.0));

    // Reaching B switches the corridor to the B-C leg
    assert_eq!(route.update(&Position::new(103.0, 2.0)), RouteStatus::OnTrack);
    assert_eq!(route.update(&Position::new(108.0, 50.0)), RouteStatus::OnTrack);
    assert_eq!(route.update(&Position::new(115.0, 50.0)), RouteStatus::OffCourse);
}

#[test]
fn test_degenerate_leg_disables_corridor() {
    let mut route = Route::new("SAME", vec![wpt("A", 0.0, 0.0), wpt("A2", 0.0, 0.0)])
        .unwrap()
        .with_max_deviation(Some(1.0));

    assert_eq!(route.update(&Position::new(50.0, 50.0)), RouteStatus::OnTrack);
}
