//! Pattern finder: enumerate candidate node subsets and confirm regular polygons.
//!
//! Purpose
//! - Turn a node snapshot plus its connection list into the set of regular
//!   triangles, squares, pentagons and hexagons the player has built.
//!
//! Search tiers (by node count)
//! - `Exhaustive` (< `small_network_limit`): bounded cycle search of every
//!   length 3–6 in the connection graph.
//! - `Triangulated` (< `dense_network_limit`): triangulate first and keep only
//!   connections that are also mesh edges. Triangles and squares come from
//!   2-/3-hop walks of that graph, pentagons and hexagons from the cycle search
//!   on it.
//! - `Dense`: per-node combinations of mesh neighbors only, capped per node and
//!   globally, with the global cap split across shape kinds. Trades recall for
//!   bounded latency.
//!
//! Conventions
//! - Every candidate must close a ring in the connection graph once its members
//!   are ordered clockwise, and must pass the shape detector.
//! - One shape per canonical key (sorted member ids). Output is sorted by
//!   `(kind, key)` so identical inputs give identical outputs.
//! - Caps are per tier and per length; they bound work, not correctness of what
//!   is returned.
//!
//! Code cross-refs: `detect::ShapeDetector`, `triangulation::triangulate`.

mod combos;
mod cycles;
mod graph;
mod neighbor;

pub use combos::combinations;
pub use cycles::find_cycles;
pub use graph::Adjacency;
pub use neighbor::{neighbor_combinations, square_walks, triangle_walks, ComboBudget};

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::Fingerprint;
use crate::detect::{DetectCfg, ShapeDetector, Tolerance};
use crate::model::{Connection, ConnectionId, Node, NodeId, NodeIndex, Shape, ShapeKind};
use crate::triangulation::{triangulate, NeighborMap, TriangulationCfg};

/// Pattern finder settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderCfg {
    /// Below this node count the connection graph is searched exhaustively.
    pub small_network_limit: usize,
    /// At or above this node count only mesh-neighbor combinations are tried.
    pub dense_network_limit: usize,
    /// Candidate caps for triangle, square, pentagon, hexagon.
    pub cycle_caps: [usize; 4],
    pub per_node_cap: usize,
    pub global_cap: usize,
    pub max_combinations: usize,
    pub tolerance: Tolerance,
    pub detect: DetectCfg,
    pub triangulation: TriangulationCfg,
}

impl Default for FinderCfg {
    fn default() -> Self {
        Self {
            small_network_limit: 50,
            dense_network_limit: 200,
            cycle_caps: [50, 30, 20, 10],
            per_node_cap: 24,
            global_cap: 600,
            max_combinations: 1000,
            tolerance: Tolerance::Adaptive,
            detect: DetectCfg::default(),
            triangulation: TriangulationCfg::default(),
        }
    }
}

impl FinderCfg {
    #[inline]
    pub fn cycle_cap(&self, kind: ShapeKind) -> usize {
        self.cycle_caps[kind.cardinality() - 3]
    }

    /// Search tier used for a network of `n` nodes.
    pub fn tier_for(&self, n: usize) -> SearchTier {
        if n < self.small_network_limit {
            SearchTier::Exhaustive
        } else if n < self.dense_network_limit {
            SearchTier::Triangulated
        } else {
            SearchTier::Dense
        }
    }
}

impl Fingerprint for FinderCfg {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.small_network_limit.hash(h);
        self.dense_network_limit.hash(h);
        self.cycle_caps.hash(h);
        self.per_node_cap.hash(h);
        self.global_cap.hash(h);
        self.max_combinations.hash(h);
        self.tolerance.fingerprint(h);
        self.detect.fingerprint(h);
        self.triangulation.fingerprint(h);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    Exhaustive,
    Triangulated,
    Dense,
}

/// Finder plus the detector it confirms candidates with.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternFinder {
    pub cfg: FinderCfg,
    pub detector: ShapeDetector,
}

impl PatternFinder {
    pub fn new(cfg: FinderCfg) -> Self {
        Self {
            cfg,
            detector: ShapeDetector::new(cfg.detect),
        }
    }

    /// All confirmed shapes of the network.
    pub fn find_shapes(&self, nodes: &[Node], connections: &[Connection]) -> Vec<Shape> {
        self.find_shapes_with(nodes, connections, None)
    }

    /// As `find_shapes`, reusing a precomputed neighbor map when one is given.
    ///
    /// The map is ignored by the exhaustive tier and computed on demand by the
    /// other tiers when absent.
    pub fn find_shapes_with(
        &self,
        nodes: &[Node],
        connections: &[Connection],
        neighbors: Option<&NeighborMap>,
    ) -> Vec<Shape> {
        if nodes.len() < 3 || connections.is_empty() {
            return Vec::new();
        }
        let adj = Adjacency::from_connections(nodes, connections);
        if adj.is_empty() {
            return Vec::new();
        }
        let tier = self.cfg.tier_for(nodes.len());
        let candidates = match tier {
            SearchTier::Exhaustive => self.exhaustive_candidates(&adj),
            SearchTier::Triangulated | SearchTier::Dense => {
                let owned;
                let map = match neighbors {
                    Some(m) => m,
                    None => {
                        owned = triangulate(nodes, self.cfg.triangulation).neighbors;
                        &owned
                    }
                };
                if tier == SearchTier::Triangulated {
                    self.triangulated_candidates(&adj, map)
                } else {
                    self.dense_candidates(map)
                }
            }
        };
        let tol = self.cfg.detect.resolve(self.cfg.tolerance, nodes);
        let shapes = self.confirm(nodes, connections, &adj, candidates.iter(), tol);
        debug!(
            tier = ?tier,
            nodes = nodes.len(),
            candidates = candidates.len(),
            shapes = shapes.len(),
            tolerance = tol,
            "pattern search"
        );
        shapes
    }

    fn exhaustive_candidates(&self, adj: &Adjacency) -> Vec<Vec<NodeId>> {
        ShapeKind::ALL
            .into_iter()
            .flat_map(|k| find_cycles(adj, k.cardinality(), self.cfg.cycle_cap(k)))
            .collect()
    }

    fn triangulated_candidates(&self, adj: &Adjacency, map: &NeighborMap) -> Vec<Vec<NodeId>> {
        let shared = adj.restricted_to(map);
        let mut out = triangle_walks(&shared, self.cfg.cycle_cap(ShapeKind::Triangle));
        out.extend(square_walks(&shared, self.cfg.cycle_cap(ShapeKind::Square)));
        for kind in [ShapeKind::Pentagon, ShapeKind::Hexagon] {
            out.extend(find_cycles(&shared, kind.cardinality(), self.cfg.cycle_cap(kind)));
        }
        out
    }

    fn dense_candidates(&self, map: &NeighborMap) -> Vec<Vec<NodeId>> {
        let mesh = Adjacency::from_neighbor_map(map);
        let mut out = Vec::new();
        // Even split of what is left; a kind that stops short passes its
        // unused share on.
        for (i, kind) in ShapeKind::ALL.into_iter().enumerate() {
            let remaining = self.cfg.global_cap.saturating_sub(out.len());
            let share = remaining / (ShapeKind::ALL.len() - i);
            if share == 0 {
                continue;
            }
            let budget = ComboBudget {
                per_node: self.cfg.per_node_cap,
                global: share,
                max_combinations: self.cfg.max_combinations,
            };
            out.extend(neighbor_combinations(&mesh, kind.cardinality(), budget));
        }
        out
    }

    /// Detector + ring check + dedup, then attach ring connection ids.
    fn confirm<'a>(
        &self,
        nodes: &[Node],
        connections: &[Connection],
        adj: &Adjacency,
        candidates: impl Iterator<Item = &'a Vec<NodeId>>,
        tol: f64,
    ) -> Vec<Shape> {
        let index = NodeIndex::new(nodes);
        let known: BTreeSet<ConnectionId> = connections.iter().map(|c| c.id).collect();
        let mut seen: BTreeSet<Vec<NodeId>> = BTreeSet::new();
        let mut accepted: BTreeMap<(ShapeKind, Vec<NodeId>), Shape> = BTreeMap::new();
        for ids in candidates {
            let mut key = ids.clone();
            key.sort();
            key.dedup();
            if key.len() != ids.len() || !seen.insert(key.clone()) {
                continue;
            }
            let Some(kind) = ShapeKind::from_cardinality(ids.len()) else {
                continue;
            };
            let Some(points) = index.positions(nodes, ids) else {
                continue;
            };
            let Some(mut shape) = Shape::from_members(ids, &points) else {
                continue;
            };
            if !adj.closes_ring(&shape.members) {
                continue;
            }
            if !self.detector.detect_points(kind, &points, tol) {
                continue;
            }
            shape.connections = shape
                .ring_pairs()
                .map(|(a, b)| ConnectionId::new(a, b))
                .filter(|c| known.contains(c))
                .collect();
            accepted.insert((kind, key), shape);
        }
        accepted.into_values().collect()
    }
}
