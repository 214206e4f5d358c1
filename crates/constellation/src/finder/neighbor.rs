//! Candidate generation over a triangulation neighbor map.
//!
//! Walk candidates are only proposals: the caller still checks ring closure in
//! the connection graph and geometric regularity.

use crate::model::NodeId;

use super::combos::combinations;
use super::graph::Adjacency;

/// Triangles `a < b < c` found by 2-hop walks `a → b → c` closing back to `a`.
pub fn triangle_walks(adj: &Adjacency, cap: usize) -> Vec<Vec<NodeId>> {
    let mut out = Vec::new();
    if cap == 0 {
        return out;
    }
    for a in adj.nodes() {
        for b in adj.neighbors(a).filter(|b| *b > a) {
            for c in adj.neighbors(b).filter(|c| *c > b) {
                if adj.connected(c, a) {
                    out.push(vec![a, b, c]);
                    if out.len() >= cap {
                        return out;
                    }
                }
            }
        }
    }
    out
}

/// 4-cycles `a → b → c → d → a` found by 3-hop walks.
///
/// `a` is the smallest id and `b < d`, so each cycle appears once.
pub fn square_walks(adj: &Adjacency, cap: usize) -> Vec<Vec<NodeId>> {
    let mut out = Vec::new();
    if cap == 0 {
        return out;
    }
    for a in adj.nodes() {
        for b in adj.neighbors(a).filter(|b| *b > a) {
            for c in adj.neighbors(b).filter(|c| *c > a && *c != b) {
                for d in adj.neighbors(c).filter(|d| *d > b && *d != c) {
                    if adj.connected(d, a) {
                        out.push(vec![a, b, c, d]);
                        if out.len() >= cap {
                            return out;
                        }
                    }
                }
            }
        }
    }
    out
}

/// Bounds for the per-node combination search.
#[derive(Clone, Copy, Debug)]
pub struct ComboBudget {
    /// Candidates per (node, size).
    pub per_node: usize,
    /// Candidates overall.
    pub global: usize,
    /// Hard cap handed to `combinations`.
    pub max_combinations: usize,
}

/// `size`-node candidates made of a node plus `size - 1` of its neighbors.
///
/// Each candidate is returned sorted; the same set reached from different
/// anchors is returned once. Stops as soon as `budget.global` is reached.
pub fn neighbor_combinations(adj: &Adjacency, size: usize, budget: ComboBudget) -> Vec<Vec<NodeId>> {
    let mut out: Vec<Vec<NodeId>> = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    if size < 3 || budget.global == 0 {
        return out;
    }
    let per_node = budget.per_node.min(budget.max_combinations);
    for anchor in adj.nodes() {
        let around: Vec<NodeId> = adj.neighbors(anchor).collect();
        if around.len() < size - 1 {
            continue;
        }
        for mut pick in combinations(&around, size - 1, per_node) {
            pick.push(anchor);
            pick.sort();
            if !seen.insert(pick.clone()) {
                continue;
            }
            out.push(pick);
            if out.len() >= budget.global {
                return out;
            }
        }
    }
    out
}
