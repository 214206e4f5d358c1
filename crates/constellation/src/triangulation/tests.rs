use super::*;
use crate::geom;
use crate::model::{Node, NodeId};
use crate::sample::{random_network, NetworkCfg, ReplayToken};
use proptest::prelude::*;

fn nodes_at(points: &[(f64, f64)]) -> Vec<Node> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Node::new(i as u64 + 1, x, y))
        .collect()
}

#[test]
fn fewer_than_three_points_is_empty() {
    for pts in [vec![], vec![(0.0, 0.0)], vec![(0.0, 0.0), (1.0, 1.0)]] {
        let t = triangulate(&nodes_at(&pts), TriangulationCfg::default());
        assert!(t.mesh.is_empty());
        assert!(t.neighbors.is_empty());
    }
}

#[test]
fn duplicate_positions_count_once() {
    let t = triangulate(
        &nodes_at(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0)]),
        TriangulationCfg::default(),
    );
    assert!(t.neighbors.is_empty());
}

#[test]
fn single_triangle() {
    let t = triangulate(
        &nodes_at(&[(0.0, 0.0), (100.0, 0.0), (50.0, 86.6)]),
        TriangulationCfg::default(),
    );
    assert_eq!(t.mesh.triangles.len(), 1);
    assert_eq!(t.mesh.edges.len(), 3);
    assert_eq!(t.mesh.hull_edges().count(), 3);
    for ns in t.neighbors.values() {
        assert_eq!(ns.len(), 2);
    }
}

#[test]
fn square_has_two_triangles_and_one_diagonal() {
    let t = triangulate(
        &nodes_at(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
        TriangulationCfg::default(),
    );
    assert_eq!(t.mesh.triangles.len(), 2);
    assert_eq!(t.mesh.edges.len(), 5);
    assert_eq!(t.mesh.hull_edges().count(), 4);
    let degree_sum: usize = t.neighbors.values().map(|s| s.len()).sum();
    assert_eq!(degree_sum, 10);
    // Every side of the square is a mesh edge.
    assert!(t.neighbors[&NodeId(1)].contains(&NodeId(2)));
    assert!(t.neighbors[&NodeId(2)].contains(&NodeId(3)));
    assert!(t.neighbors[&NodeId(3)].contains(&NodeId(4)));
    assert!(t.neighbors[&NodeId(4)].contains(&NodeId(1)));
}

#[test]
fn input_is_capped_by_order() {
    let cfg = TriangulationCfg {
        max_points: 5,
        ..TriangulationCfg::default()
    };
    let nodes = random_network(
        NetworkCfg {
            node_count: 12,
            ..NetworkCfg::default()
        },
        ReplayToken::new(5),
    );
    let t = triangulate(&nodes, cfg);
    let expected: Vec<NodeId> = nodes.iter().take(5).map(|n| n.id).collect();
    assert_eq!(t.mesh.ids, expected);
    assert!(t.neighbors.keys().all(|id| expected.contains(id)));
}

#[test]
fn collinear_input_degrades_gracefully() {
    let t = triangulate(
        &nodes_at(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]),
        TriangulationCfg::default(),
    );
    for tri in &t.mesh.triangles {
        assert!(tri.circumradius.is_finite());
    }
}

#[test]
fn keep_super_triangle_retains_outer_triangles() {
    let nodes = nodes_at(&[(0.0, 0.0), (1.0, 0.0), (0.5, 0.8)]);
    let kept = triangulate(
        &nodes,
        TriangulationCfg {
            keep_super_triangle: true,
            ..TriangulationCfg::default()
        },
    );
    let plain = triangulate(&nodes, TriangulationCfg::default());
    assert!(kept.mesh.triangles.len() > plain.mesh.triangles.len());
    // Neighbor map never mentions the super-triangle corners.
    assert_eq!(kept.neighbors, plain.neighbors);
    let mesh = &kept.mesh;
    assert!((0..3).all(|i| mesh.is_input_point(i)));
    assert!((3..mesh.points.len()).all(|i| !mesh.is_input_point(i)));
    assert!(mesh
        .triangles
        .iter()
        .any(|t| t.vertices.iter().any(|&v| !mesh.is_input_point(v))));
}

#[test]
fn empty_circumcircle_on_random_network() {
    let nodes = random_network(
        NetworkCfg {
            node_count: 80,
            ..NetworkCfg::default()
        },
        ReplayToken::new(11),
    );
    let t = triangulate(&nodes, TriangulationCfg::default());
    assert!(!t.mesh.is_empty());
    for tri in &t.mesh.triangles {
        for (i, p) in t.mesh.points.iter().enumerate().take(t.mesh.ids.len()) {
            if tri.has_vertex(i) {
                continue;
            }
            let d = geom::distance(*p, tri.circumcenter);
            assert!(d >= tri.circumradius * (1.0 - 1e-9));
        }
    }
}

fn arb_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.0f64..500.0, 0.0f64..500.0), 3..40)
}

proptest! {
    #[test]
    fn mesh_is_consistent(pts in arb_points()) {
        let t = triangulate(&nodes_at(&pts), TriangulationCfg::default());
        for (ti, tri) in t.mesh.triangles.iter().enumerate() {
            let [a, b, c] = tri.vertices;
            let o = geom::orient(t.mesh.points[a], t.mesh.points[b], t.mesh.points[c]);
            prop_assert!(o >= 0.0);
            for nb in tri.neighbors.iter().flatten() {
                prop_assert!(t.mesh.triangles[*nb].neighbors.contains(&Some(ti)));
            }
        }
        for (id, ns) in &t.neighbors {
            for other in ns {
                prop_assert!(t.neighbors[other].contains(id));
            }
        }
    }
}
