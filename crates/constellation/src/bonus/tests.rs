use super::*;
use crate::geom::Vec2;
use crate::model::{derive_connections, link_ring, NodeId, NodeIndex, NodeKind};
use crate::sample::ring_nodes;
use nalgebra::vector;

fn shape_of(nodes: &[Node], ids: &[u64]) -> Shape {
    let ids: Vec<NodeId> = ids.iter().copied().map(NodeId).collect();
    let index = NodeIndex::new(nodes);
    let pts: Vec<Vec2> = index.positions(nodes, &ids).unwrap();
    Shape::from_members(&ids, &pts).unwrap()
}

fn triangle() -> (Vec<Node>, Shape) {
    let nodes = ring_nodes(1, &[vector![0.0, 0.0], vector![100.0, 0.0], vector![50.0, 86.6]]);
    let s = shape_of(&nodes, &[1, 2, 3]);
    (nodes, s)
}

/// Squares 1-2-3-4 and 2-5-6-3 sharing the edge 2-3.
fn edge_sharing_squares() -> (Vec<Node>, Vec<Shape>) {
    let mut nodes = vec![
        Node::new(1, 0.0, 0.0),
        Node::new(2, 100.0, 0.0),
        Node::new(3, 100.0, 100.0),
        Node::new(4, 0.0, 100.0),
        Node::new(5, 200.0, 0.0),
        Node::new(6, 200.0, 100.0),
    ];
    link_ring(&mut nodes, &[NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    link_ring(&mut nodes, &[NodeId(2), NodeId(5), NodeId(6), NodeId(3)]);
    let shapes = vec![shape_of(&nodes, &[1, 2, 3, 4]), shape_of(&nodes, &[2, 5, 6, 3])];
    (nodes, shapes)
}

#[test]
fn empty_input_is_neutral() {
    let r = calculate(&[], &[], &BonusConfig::default());
    assert_eq!(r.multiplier, 1.0);
    assert!(r.contributions.is_empty());
    assert!(r.overlaps.is_empty());
    assert!(r.validate().is_ok());
    assert!(r.validate().warnings.is_empty());
    assert_eq!(r.resource_rates[&ResourceKind::Energy], 1.0);
}

#[test]
fn single_triangle_multiplicative_is_base_times_weights() {
    let (nodes, s) = triangle();
    let r = calculate(&[s], &nodes, &BonusConfig::default());
    // Level 1, two links → quality 1, standard kind → weight 1.
    assert!((r.multiplier - 1.5).abs() < 1e-12);
    assert_eq!(r.contributions.len(), 3);
    assert!(r.contributions.iter().all(|c| (c.multiplier - 1.5).abs() < 1e-12));
    assert_eq!(r.shapes.len(), 1);
    assert!((r.shapes[0].share - 1.0).abs() < 1e-12);
}

#[test]
fn node_weights_scale_contributions() {
    let (mut nodes, s) = triangle();
    for n in &mut nodes {
        n.kind = NodeKind::Amplifier;
        n.level = 4;
    }
    let r = calculate(&[s], &nodes, &BonusConfig::default());
    // floor((4 + 2) / 2) = 3 → 1.1; amplifier 1.2.
    let expected = 1.5 * 1.2 * 1.1;
    assert!((r.multiplier - expected).abs() < 1e-9);
    assert!(r.multiplier >= 1.5);
}

#[test]
fn overlap_classification() {
    let (nodes, shapes) = edge_sharing_squares();
    let (kind, shared, severity) = classify(&shapes[0], &shapes[1]);
    assert_eq!(kind, OverlapKind::Edge);
    assert_eq!(shared, vec![NodeId(2), NodeId(3)]);
    assert!((severity - 0.5).abs() < 1e-12);

    let (identical, _, sev) = classify(&shapes[0], &shapes[0]);
    assert_eq!(identical, OverlapKind::Identical);
    assert_eq!(sev, 1.0);

    let tri = shape_of(&nodes, &[1, 2, 4]);
    assert_eq!(classify(&tri, &shapes[0]).0, OverlapKind::Nested);

    // Shares only node 2 with the first square.
    let far = shape_of(&nodes, &[2, 5, 6]);
    assert_eq!(classify(&shapes[0], &far).0, OverlapKind::Vertex);

    let sq_a = shape_of(&nodes, &[1, 2, 3, 4]);
    let disjoint = ring_nodes(10, &[vector![0.0, 500.0], vector![50.0, 500.0], vector![25.0, 540.0]]);
    let d = shape_of(&disjoint, &[10, 11, 12]);
    assert_eq!(classify(&sq_a, &d).0, OverlapKind::None);
}

#[test]
fn partial_overlap_without_shared_edge() {
    // Hexagon 1..6 and a pentagon sharing the non-consecutive members 1, 3, 5.
    let hex = ring_nodes(1, &crate::sample::regular_polygon(6, vector![0.0, 0.0], 100.0, 0.0));
    let mut nodes = hex.clone();
    nodes.extend([Node::new(7, 300.0, 300.0), Node::new(8, -300.0, 300.0)]);
    let h = shape_of(&nodes, &[1, 2, 3, 4, 5, 6]);
    let p = Shape {
        members: vec![NodeId(1), NodeId(7), NodeId(3), NodeId(8), NodeId(5)],
        ..shape_of(&nodes, &[1, 7, 3, 8, 5])
    };
    assert_eq!(classify(&h, &p).0, OverlapKind::Partial);
    assert_eq!(classify(&p, &h).0, OverlapKind::Partial);
}

#[test]
fn overlap_classification_is_symmetric() {
    let (nodes, shapes) = edge_sharing_squares();
    let mut all = shapes.clone();
    all.push(shape_of(&nodes, &[1, 2, 4]));
    all.push(shape_of(&nodes, &[2, 5, 6]));
    for a in &all {
        for b in &all {
            let (ka, sa, va) = classify(a, b);
            let (kb, sb, vb) = classify(b, a);
            assert_eq!(ka, kb, "{} vs {}", a.id, b.id);
            assert_eq!(sa, sb);
            assert!((va - vb).abs() < 1e-12);
        }
    }
}

#[test]
fn edge_sharing_squares_are_penalized() {
    let (nodes, shapes) = edge_sharing_squares();
    let r = calculate(&shapes, &nodes, &BonusConfig::default());
    assert_eq!(r.overlaps.len(), 1);
    assert_eq!(r.overlaps[0].kind, OverlapKind::Edge);
    let product = shapes.iter().map(|s| s.base_bonus).product::<f64>();
    assert!(r.multiplier < product);
    assert!(r.multiplier > 1.0);
    let shared = r.contributions.iter().find(|c| c.node == NodeId(2)).unwrap();
    assert!((shared.overlap_factor - 0.925).abs() < 1e-12);
    let outer = r.contributions.iter().find(|c| c.node == NodeId(1)).unwrap();
    assert_eq!(outer.overlap_factor, 1.0);
    assert!(r.shapes.iter().all(|b| b.overlap_count == 1 && b.effective_bonus < b.base_bonus));
}

#[test]
fn min_overlap_threshold_filters() {
    let (nodes, shapes) = edge_sharing_squares();
    let cfg = BonusConfig {
        min_overlap_threshold: 0.6,
        ..BonusConfig::default()
    };
    let r = calculate(&shapes, &nodes, &cfg);
    assert!(r.overlaps.is_empty());
}

#[test]
fn overlap_at_exactly_the_threshold_is_dropped() {
    let (_, shapes) = edge_sharing_squares();
    // Two of four members shared on both sides.
    let (_, _, severity) = classify(&shapes[0], &shapes[1]);
    assert!((severity - 0.5).abs() < 1e-12);
    assert!(detect_overlaps(&shapes, 0.5).is_empty());
    assert_eq!(detect_overlaps(&shapes, 0.49).len(), 1);
}

#[test]
fn overlap_pairs_name_the_smaller_id_first() {
    let (_, mut shapes) = edge_sharing_squares();
    shapes.reverse();
    let found = detect_overlaps(&shapes, 0.0);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].a, ShapeId("square:1-2-3-4".into()));
    assert_eq!(found[0].b, ShapeId("square:2-3-5-6".into()));
    assert!(found[0].a < found[0].b);
}

#[test]
fn strategies_order_on_the_same_input() {
    let (nodes, shapes) = edge_sharing_squares();
    let results: Vec<f64> = StackingStrategy::ALL
        .into_iter()
        .map(|s| calculate(&shapes, &nodes, &BonusConfig::default().with_strategy(s)).multiplier)
        .collect();
    // Under `maximum` each node keeps its best base bonus (2.0); the shared
    // nodes lose a little to the edge overlap, the outer ones do not.
    assert!((results[2] - 2.0).abs() < 1e-12);
    // Product stacking on the shared nodes beats the additive base combination.
    assert!(results[0] > results[1]);
    assert!(results.iter().all(|m| *m >= 1.0 && m.is_finite()));
}

#[test]
fn stack_formulas() {
    let c = |m: f64, w: f64| NodeContribution {
        node: NodeId(0),
        shapes: Vec::new(),
        base: m,
        type_weight: 1.0,
        quality_weight: 1.0,
        overlap_factor: 1.0,
        multiplier: m,
        weight: w,
    };
    let cs = vec![c(1.5, 1.0), c(4.0, 3.0)];
    let mul = stack(StackingStrategy::Multiplicative, &cs);
    assert!((mul - (0.25 * 1.5f64.ln() + 0.75 * 4.0f64.ln()).exp()).abs() < 1e-12);
    let add = stack(StackingStrategy::Additive, &cs);
    assert!((add - (1.0 + 0.25 * 0.5 + 0.75 * 3.0)).abs() < 1e-12);
    assert_eq!(stack(StackingStrategy::Maximum, &cs), 4.0);
    let w = stack(StackingStrategy::Weighted, &cs);
    assert!((w - (1.5f64.powf(0.25) + 0.75 * 3.0)).abs() < 1e-12);
    assert_eq!(stack(StackingStrategy::Additive, &[]), 1.0);
}

#[test]
fn diminishing_returns_and_cap() {
    let cfg = BonusConfig::default();
    assert_eq!(post_process(0.5, &cfg), 1.0);
    assert_eq!(post_process(8.0, &cfg), 8.0);
    assert!((post_process(15.0, &cfg) - (10.0 + 5.0 * 0.8)).abs() < 1e-12);
    let capped = BonusConfig {
        max_multiplier_cap: 12.0,
        ..BonusConfig::default()
    };
    assert_eq!(post_process(50.0, &capped), 12.0);
    assert_eq!(post_process(f64::NAN, &cfg), 1.0);
}

#[test]
fn resource_rates_follow_weights() {
    let cfg = BonusConfig {
        target_resource_types: vec![ResourceKind::Energy, ResourceKind::Data],
        ..BonusConfig::default()
    };
    let rates = resource_rates(2.0, &cfg);
    assert!((rates[&ResourceKind::Energy] - 2.0).abs() < 1e-12);
    assert!((rates[&ResourceKind::Data] - 0.25 * 2.2).abs() < 1e-12);
    assert_eq!(rates[&ResourceKind::Matter], 0.5);
    assert_eq!(rates[&ResourceKind::Influence], 0.1);
}

#[test]
fn calculation_is_idempotent() {
    let (nodes, shapes) = edge_sharing_squares();
    let calc = BonusCalculator::default();
    assert_eq!(calc.calculate(&shapes, &nodes), calc.calculate(&shapes, &nodes));
    let conns = derive_connections(&nodes);
    assert_eq!(conns.len(), 7);
}

#[test]
fn validation_flags() {
    let (nodes, s) = triangle();
    let mut r = calculate(&[s], &nodes, &BonusConfig::default());
    assert!(r.validate().is_ok());

    r.multiplier = 1.0;
    let v = r.validate();
    assert!(v.is_ok());
    assert!(matches!(v.warnings[0], ValidationIssue::Neutral { contributions: 3 }));

    r.multiplier = 0.9;
    assert!(matches!(r.validate().errors[0], ValidationIssue::BelowOne { .. }));

    r.multiplier = f64::INFINITY;
    assert_eq!(r.validate().errors, vec![ValidationIssue::NonFinite]);

    r.multiplier = 2000.0;
    let v = r.validate();
    assert!(v.is_ok());
    assert!(matches!(v.warnings[0], ValidationIssue::Excessive { .. }));
}
