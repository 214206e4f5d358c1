//! Data model shared by every component.
//!
//! - `Node`: a placed beacon (id, position, level, kind, connections).
//! - `Connection`: an unordered node pair derived from the node list.
//! - `Shape`: a confirmed regular polygon emitted by the pattern finder.
//!
//! All entities are snapshots: they are recomputed per query and never mutated
//! by the components that consume them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{self, Vec2};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Beacon category. The set is fixed; weights per kind live in the configs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Standard,
    Harvester,
    Amplifier,
    Relay,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Standard,
        NodeKind::Harvester,
        NodeKind::Amplifier,
        NodeKind::Relay,
    ];

    /// Contribution of this kind to connection strength.
    pub fn link_strength(self) -> f64 {
        match self {
            NodeKind::Standard => 1.0,
            NodeKind::Harvester => 0.9,
            NodeKind::Amplifier => 1.25,
            NodeKind::Relay => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Standard => "standard",
            NodeKind::Harvester => "harvester",
            NodeKind::Amplifier => "amplifier",
            NodeKind::Relay => "relay",
        }
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown node kind `{s}`"))
    }
}

/// A placed beacon.
///
/// Invariant (owned by the caller): connections are symmetric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec2,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub connections: Vec<NodeId>,
}

fn default_level() -> u32 {
    1
}

impl Node {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id: NodeId(id),
            position: Vec2::new(x, y),
            level: 1,
            kind: NodeKind::Standard,
            connections: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Level with the `≥ 1` invariant enforced.
    #[inline]
    pub fn effective_level(&self) -> u32 {
        self.level.max(1)
    }
}

/// Add a symmetric link between two nodes of a mutable node list (test/CLI helper).
pub fn link(nodes: &mut [Node], a: NodeId, b: NodeId) {
    if a == b {
        return;
    }
    for n in nodes.iter_mut() {
        let other = if n.id == a {
            b
        } else if n.id == b {
            a
        } else {
            continue;
        };
        if !n.connections.contains(&other) {
            n.connections.push(other);
        }
    }
}

/// Link the nodes into a closed ring in the given order.
pub fn link_ring(nodes: &mut [Node], ring: &[NodeId]) {
    for i in 0..ring.len() {
        link(nodes, ring[i], ring[(i + 1) % ring.len()]);
    }
}

/// Id → index lookup over a node slice. Later duplicates are ignored.
#[derive(Clone, Debug, Default)]
pub struct NodeIndex {
    map: HashMap<NodeId, usize>,
}

impl NodeIndex {
    pub fn new(nodes: &[Node]) -> Self {
        let mut map = HashMap::with_capacity(nodes.len());
        for (i, n) in nodes.iter().enumerate() {
            map.entry(n.id).or_insert(i);
        }
        Self { map }
    }

    #[inline]
    pub fn get<'a>(&self, nodes: &'a [Node], id: NodeId) -> Option<&'a Node> {
        self.map.get(&id).and_then(|&i| nodes.get(i))
    }

    /// Resolve all ids or none.
    pub fn positions(&self, nodes: &[Node], ids: &[NodeId]) -> Option<Vec<Vec2>> {
        ids.iter()
            .map(|id| self.get(nodes, *id).map(|n| n.position))
            .collect()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.map.contains_key(&id)
    }
}

/// Unordered node pair, stored normalized as `(min, max)`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConnectionId(pub NodeId, pub NodeId);

impl ConnectionId {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Derived link between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub a: NodeId,
    pub b: NodeId,
    pub strength: f64,
    pub active: bool,
    pub shapes: Vec<ShapeId>,
}

/// Connections below this strength are reported inactive.
pub const MIN_ACTIVE_STRENGTH: f64 = 1.0;

/// Derive one connection per unordered pair listed by either endpoint.
///
/// Pairs with an unresolved endpoint or a self-link are skipped. Output is
/// sorted by id.
pub fn derive_connections(nodes: &[Node]) -> Vec<Connection> {
    let index = NodeIndex::new(nodes);
    let mut seen: BTreeSet<ConnectionId> = BTreeSet::new();
    for n in nodes {
        for &other in &n.connections {
            if other == n.id || !index.contains(other) {
                continue;
            }
            seen.insert(ConnectionId::new(n.id, other));
        }
    }
    seen.into_iter()
        .filter_map(|id| {
            let a = index.get(nodes, id.0)?;
            let b = index.get(nodes, id.1)?;
            let level = (a.effective_level() + b.effective_level()) as f64 / 2.0;
            let kind = (a.kind.link_strength() + b.kind.link_strength()) / 2.0;
            let strength = level * kind;
            Some(Connection {
                id,
                a: id.0,
                b: id.1,
                strength,
                active: strength >= MIN_ACTIVE_STRENGTH,
                shapes: Vec::new(),
            })
        })
        .collect()
}

/// Fill `Connection::shapes` from the shapes' ring connections.
pub fn annotate_connections(connections: &mut [Connection], shapes: &[Shape]) {
    let mut by_conn: BTreeMap<ConnectionId, Vec<ShapeId>> = BTreeMap::new();
    for s in shapes {
        for c in &s.connections {
            by_conn.entry(*c).or_default().push(s.id.clone());
        }
    }
    for c in connections.iter_mut() {
        c.shapes = by_conn.remove(&c.id).unwrap_or_default();
    }
}

/// The four supported polygon kinds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Triangle,
    Square,
    Pentagon,
    Hexagon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Triangle,
        ShapeKind::Square,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
    ];

    #[inline]
    pub fn cardinality(self) -> usize {
        match self {
            ShapeKind::Triangle => 3,
            ShapeKind::Square => 4,
            ShapeKind::Pentagon => 5,
            ShapeKind::Hexagon => 6,
        }
    }

    pub fn from_cardinality(n: usize) -> Option<Self> {
        match n {
            3 => Some(ShapeKind::Triangle),
            4 => Some(ShapeKind::Square),
            5 => Some(ShapeKind::Pentagon),
            6 => Some(ShapeKind::Hexagon),
            _ => None,
        }
    }

    /// Fixed production bonus of a completed shape.
    #[inline]
    pub fn base_bonus(self) -> f64 {
        match self {
            ShapeKind::Triangle => 1.5,
            ShapeKind::Square => 2.0,
            ShapeKind::Pentagon => 2.5,
            ShapeKind::Hexagon => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Triangle => "triangle",
            ShapeKind::Square => "square",
            ShapeKind::Pentagon => "pentagon",
            ShapeKind::Hexagon => "hexagon",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"<kind>:<sorted member ids joined by '-'>"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(kind: ShapeKind, members: &[NodeId]) -> Self {
        let mut sorted = members.to_vec();
        sorted.sort();
        let ids: Vec<String> = sorted.iter().map(|id| id.to_string()).collect();
        Self(format!("{}:{}", kind, ids.join("-")))
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed regular polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Clockwise ring, rotated so that the smallest id comes first.
    pub members: Vec<NodeId>,
    pub centroid: Vec2,
    pub base_bonus: f64,
    pub connections: Vec<ConnectionId>,
    pub complete: bool,
}

impl Shape {
    /// Build a shape from members and their positions (same order).
    ///
    /// The ring is reordered clockwise and rotated to start at the smallest id.
    /// Returns `None` if the member count does not match any `ShapeKind` or the
    /// lengths disagree.
    pub fn from_members(members: &[NodeId], positions: &[Vec2]) -> Option<Self> {
        if members.len() != positions.len() {
            return None;
        }
        let kind = ShapeKind::from_cardinality(members.len())?;
        let order = geom::sort_clockwise(positions);
        let mut ring: Vec<NodeId> = order.iter().map(|&i| members[i]).collect();
        let start = ring
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map(|(i, _)| i)
            .unwrap_or(0);
        ring.rotate_left(start);
        Some(Self {
            id: ShapeId::new(kind, &ring),
            kind,
            members: ring,
            centroid: geom::centroid(positions),
            base_bonus: kind.base_bonus(),
            connections: Vec::new(),
            complete: true,
        })
    }

    /// Sorted member ids; two shapes with the same key are the same shape.
    pub fn canonical_key(&self) -> Vec<NodeId> {
        let mut k = self.members.clone();
        k.sort();
        k
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Consecutive member pairs of the ring (with wraparound).
    pub fn ring_pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let n = self.members.len();
        (0..n).map(move |i| (self.members[i], self.members[(i + 1) % n]))
    }

    /// True if `a` and `b` are adjacent on the ring.
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.ring_pairs()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

/// A partially present shape and the positions that would complete it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncompletePattern {
    pub kind: ShapeKind,
    pub members: Vec<NodeId>,
    pub missing: Vec<Vec2>,
    pub feasibility: f64,
    pub proximity: f64,
    /// At least one missing position was moved by the placement collaborator.
    pub nudged: bool,
}

/// Consistency problems in a node snapshot. Advisory only.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NetworkIssue {
    #[error("node id {0} appears more than once")]
    DuplicateId(NodeId),
    #[error("node {0} lists itself as a connection")]
    SelfLink(NodeId),
    #[error("node {from} links to unknown node {to}")]
    Dangling { from: NodeId, to: NodeId },
    #[error("node {from} links to {to} but not vice versa")]
    Asymmetric { from: NodeId, to: NodeId },
}

/// Report consistency problems without rejecting the snapshot.
pub fn network_issues(nodes: &[Node]) -> Vec<NetworkIssue> {
    let index = NodeIndex::new(nodes);
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    for n in nodes {
        if !seen.insert(n.id) {
            issues.push(NetworkIssue::DuplicateId(n.id));
        }
    }
    for n in nodes {
        for &other in &n.connections {
            if other == n.id {
                issues.push(NetworkIssue::SelfLink(n.id));
                continue;
            }
            match index.get(nodes, other) {
                None => issues.push(NetworkIssue::Dangling {
                    from: n.id,
                    to: other,
                }),
                Some(o) if !o.connections.contains(&n.id) => {
                    issues.push(NetworkIssue::Asymmetric {
                        from: n.id,
                        to: other,
                    })
                }
                Some(_) => {}
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Node> {
        let mut nodes = vec![
            Node::new(1, 0.0, 0.0),
            Node::new(2, 1.0, 0.0),
            Node::new(3, 1.0, 1.0),
            Node::new(4, 0.0, 1.0),
        ];
        link_ring(&mut nodes, &[NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
        nodes
    }

    #[test]
    fn shape_id_is_order_independent() {
        let a = ShapeId::new(ShapeKind::Triangle, &[NodeId(3), NodeId(1), NodeId(2)]);
        let b = ShapeId::new(ShapeKind::Triangle, &[NodeId(2), NodeId(3), NodeId(1)]);
        assert_eq!(a, b);
        assert_eq!(a.0, "triangle:1-2-3");
    }

    #[test]
    fn shape_ring_starts_at_smallest_id() {
        let nodes = square();
        let ids: Vec<NodeId> = vec![NodeId(3), NodeId(1), NodeId(4), NodeId(2)];
        let index = NodeIndex::new(&nodes);
        let pos = index.positions(&nodes, &ids).unwrap();
        let s = Shape::from_members(&ids, &pos).unwrap();
        assert_eq!(s.members[0], NodeId(1));
        assert_eq!(s.kind, ShapeKind::Square);
        assert!(s.are_adjacent(NodeId(1), NodeId(2)));
        assert!(s.are_adjacent(NodeId(4), NodeId(1)));
        assert!(!s.are_adjacent(NodeId(1), NodeId(3)));
    }

    #[test]
    fn connections_are_deduplicated_and_sorted() {
        let nodes = square();
        let conns = derive_connections(&nodes);
        assert_eq!(conns.len(), 4);
        assert!(conns.windows(2).all(|w| w[0].id < w[1].id));
        assert!(conns.iter().all(|c| c.active && (c.strength - 1.0).abs() < 1e-12));
    }

    #[test]
    fn issues_reported_not_fatal() {
        let mut nodes = square();
        nodes[0].connections.push(NodeId(99));
        nodes[1].connections.push(NodeId(4));
        let issues = network_issues(&nodes);
        assert!(issues.contains(&NetworkIssue::Dangling {
            from: NodeId(1),
            to: NodeId(99)
        }));
        assert!(issues.contains(&NetworkIssue::Asymmetric {
            from: NodeId(2),
            to: NodeId(4)
        }));
        // Dangling link is skipped by derivation; asymmetric one is kept.
        assert_eq!(derive_connections(&nodes).len(), 5);
    }

    #[test]
    fn node_json_defaults() {
        let n: Node = serde_json::from_str(r#"{"id":7,"position":[1.0,2.0]}"#).unwrap();
        assert_eq!(n.level, 1);
        assert_eq!(n.kind, NodeKind::Standard);
        assert!(n.connections.is_empty());
    }
}
