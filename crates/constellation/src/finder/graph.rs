//! Undirected adjacency over node ids (sorted, deterministic iteration).

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Connection, Node, NodeId, NodeIndex};
use crate::triangulation::NeighborMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    map: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Adjacency {
    /// Adjacency of the connection list, keeping only pairs whose ends resolve in `nodes`.
    pub fn from_connections(nodes: &[Node], connections: &[Connection]) -> Self {
        let index = NodeIndex::new(nodes);
        let mut map: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for c in connections {
            if c.a == c.b || !index.contains(c.a) || !index.contains(c.b) {
                continue;
            }
            map.entry(c.a).or_default().insert(c.b);
            map.entry(c.b).or_default().insert(c.a);
        }
        Self { map }
    }

    /// Adjacency straight from a neighbor map (assumed symmetric).
    pub fn from_neighbor_map(neighbors: &NeighborMap) -> Self {
        Self {
            map: neighbors.clone(),
        }
    }

    /// Edges present both here and in `neighbors`.
    pub fn restricted_to(&self, neighbors: &NeighborMap) -> Self {
        let mut map = BTreeMap::new();
        for (a, ns) in &self.map {
            let Some(allowed) = neighbors.get(a) else {
                continue;
            };
            let kept: BTreeSet<NodeId> = ns.intersection(allowed).copied().collect();
            if !kept.is_empty() {
                map.insert(*a, kept);
            }
        }
        Self { map }
    }

    #[inline]
    pub fn connected(&self, a: NodeId, b: NodeId) -> bool {
        self.map.get(&a).is_some_and(|s| s.contains(&b))
    }

    pub fn neighbors(&self, a: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.map.get(&a).into_iter().flatten().copied()
    }

    pub fn degree(&self, a: NodeId) -> usize {
        self.map.get(&a).map_or(0, |s| s.len())
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.map.keys().copied()
    }

    /// Every consecutive pair of `ring` (with wraparound) is an edge.
    pub fn closes_ring(&self, ring: &[NodeId]) -> bool {
        ring.len() >= 3
            && (0..ring.len()).all(|i| self.connected(ring[i], ring[(i + 1) % ring.len()]))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
