use super::*;
use crate::model::{Node, NodeId};
use crate::sample::{jitter, regular_polygon, ring_nodes, ReplayToken};
use nalgebra::vector;
use proptest::prelude::*;

fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<NodeId> {
    range.map(NodeId).collect()
}

fn unit_square() -> Vec<Node> {
    vec![
        Node::new(1, 0.0, 0.0),
        Node::new(2, 1.0, 0.0),
        Node::new(3, 1.0, 1.0),
        Node::new(4, 0.0, 1.0),
    ]
}

#[test]
fn unit_square_accepted_at_any_tolerance() {
    let nodes = unit_square();
    let d = ShapeDetector::default();
    assert!(d.detect_square(&nodes, &ids(1..=4), true));
    assert!(d.detect_square(&nodes, &ids(1..=4), false));
    for tol in [0.0, 0.01, 0.4] {
        let pts: Vec<Vec2> = nodes.iter().map(|n| n.position).collect();
        assert!(d.detect_points(ShapeKind::Square, &pts, tol));
    }
    // Candidate order does not matter.
    let shuffled = vec![NodeId(3), NodeId(1), NodeId(4), NodeId(2)];
    assert!(d.detect_square(&nodes, &shuffled, true));
}

#[test]
fn collinear_points_rejected() {
    let d = ShapeDetector::default();
    for n in 3..=6 {
        let pts: Vec<Vec2> = (0..n).map(|i| vector![i as f64, 0.0]).collect();
        let kind = ShapeKind::from_cardinality(n).unwrap();
        assert!(!d.detect_points(kind, &pts, 0.4), "collinear {kind} accepted");
    }
}

#[test]
fn count_mismatch_and_unresolved_ids_are_false() {
    let nodes = unit_square();
    let d = ShapeDetector::default();
    assert!(!d.detect_square(&nodes, &ids(1..=3), true));
    assert!(!d.detect_triangle(&nodes, &ids(1..=4), true));
    assert!(!d.detect_square(&nodes, &[NodeId(1), NodeId(2), NodeId(3), NodeId(99)], true));
}

#[test]
fn rectangle_is_not_a_square() {
    let pts = vec![
        vector![0.0, 0.0],
        vector![2.0, 0.0],
        vector![2.0, 1.0],
        vector![0.0, 1.0],
    ];
    assert!(!ShapeDetector::default().detect_points(ShapeKind::Square, &pts, 0.25));
}

#[test]
fn rhombus_is_not_a_square() {
    // Equal sides, unequal radii and diagonals.
    let pts = vec![
        vector![0.0, 0.0],
        vector![1.0, 0.0],
        vector![1.5, 0.866],
        vector![0.5, 0.866],
    ];
    assert!(!ShapeDetector::default().detect_points(ShapeKind::Square, &pts, 0.2));
}

#[test]
fn triangles_by_side_ratio() {
    let d = ShapeDetector::default();
    let equilateral = vec![vector![0.0, 0.0], vector![100.0, 0.0], vector![50.0, 86.6]];
    assert!(d.detect_points(ShapeKind::Triangle, &equilateral, 0.15));
    let skinny = vec![vector![0.0, 0.0], vector![10.0, 0.0], vector![0.0, 2.0]];
    assert!(!d.detect_points(ShapeKind::Triangle, &skinny, 0.4));
    let right_isosceles = vec![vector![0.0, 0.0], vector![10.0, 0.0], vector![0.0, 10.0]];
    assert!(d.detect_points(ShapeKind::Triangle, &right_isosceles, 0.15));
}

#[test]
fn regular_pentagon_and_hexagon() {
    let d = ShapeDetector::default();
    let c = vector![300.0, -20.0];
    let pent = regular_polygon(5, c, 80.0, 0.4);
    let hex = regular_polygon(6, c, 80.0, 1.1);
    assert!(d.detect_points(ShapeKind::Pentagon, &pent, 0.0));
    assert!(d.detect_points(ShapeKind::Hexagon, &hex, 0.0));
    assert!(!d.detect_points(ShapeKind::Hexagon, &pent, 0.4));
    assert_eq!(d.classify_points(&hex, 0.1), Some(ShapeKind::Hexagon));
}

#[test]
fn jittered_hexagon_needs_tolerance() {
    let d = ShapeDetector::default();
    let mut nodes = ring_nodes(1, &regular_polygon(6, vector![0.0, 0.0], 100.0, 0.0));
    jitter(&mut nodes, 4.0, ReplayToken::new(9));
    let pts: Vec<Vec2> = nodes.iter().map(|n| n.position).collect();
    assert!(d.detect_points(ShapeKind::Hexagon, &pts, 0.25));
    assert!(!d.detect_points(ShapeKind::Hexagon, &pts, 0.001));
}

#[test]
fn adaptive_tolerance_tracks_spacing() {
    let cfg = DetectCfg::default();
    let dense = vec![Node::new(1, 0.0, 0.0), Node::new(2, 30.0, 0.0)];
    let sparse = vec![Node::new(1, 0.0, 0.0), Node::new(2, 1000.0, 0.0)];
    let mid = vec![Node::new(1, 0.0, 0.0), Node::new(2, 150.0, 0.0)];
    assert!((adaptive_tolerance(&dense, &cfg) - 0.15).abs() < 1e-12);
    assert!((adaptive_tolerance(&sparse, &cfg) - 0.4).abs() < 1e-12);
    assert!((adaptive_tolerance(&mid, &cfg) - 0.275).abs() < 1e-12);
    assert!((adaptive_tolerance(&dense[..1], &cfg) - cfg.fixed_tolerance).abs() < 1e-12);
    assert_eq!(cfg.resolve(Tolerance::Fixed(0.3), &dense), 0.3);
}

#[test]
fn regularity_of_exact_polygon_is_zero() {
    let ring = clockwise(&regular_polygon(5, vector![1.0, 2.0], 3.0, 0.0));
    let r = regularity(&ring).unwrap();
    assert!(r.worst() < 1e-9);
}

#[test]
fn worst_regularity_is_the_largest_deviation() {
    // A 2:1 rectangle: equal radii, uneven sides and central angles.
    let ring = clockwise(&[
        vector![0.0, 0.0],
        vector![200.0, 0.0],
        vector![200.0, 100.0],
        vector![0.0, 100.0],
    ]);
    let r = regularity(&ring).unwrap();
    assert!(r.radius < 1e-9);
    assert!((r.side - 1.0 / 3.0).abs() < 1e-9);
    assert!(r.turn > r.side);
    assert_eq!(r.worst(), r.turn);
}

proptest! {
    #[test]
    fn exact_regular_polygons_always_pass(
        n in 3usize..=6,
        cx in -1e3f64..1e3,
        cy in -1e3f64..1e3,
        radius in 1.0f64..500.0,
        phase in 0.0f64..std::f64::consts::TAU,
    ) {
        let pts = regular_polygon(n, vector![cx, cy], radius, phase);
        let kind = ShapeKind::from_cardinality(n).unwrap();
        prop_assert!(ShapeDetector::default().detect_points(kind, &pts, 0.0));
    }
}
