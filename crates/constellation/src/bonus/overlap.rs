//! Pairwise shape overlaps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, Shape, ShapeId};

/// Structural relationship between two shapes, weakest first.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OverlapKind {
    #[default]
    None,
    Vertex,
    Partial,
    Edge,
    Nested,
    Identical,
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlapKind::None => "none",
            OverlapKind::Vertex => "vertex",
            OverlapKind::Partial => "partial",
            OverlapKind::Edge => "edge",
            OverlapKind::Nested => "nested",
            OverlapKind::Identical => "identical",
        })
    }
}

/// A retained overlap between `a` and `b`, with `a < b`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub a: ShapeId,
    pub b: ShapeId,
    pub kind: OverlapKind,
    /// Sorted shared member ids.
    pub shared: Vec<NodeId>,
    /// Mean of `shared / size` over both shapes, in `[0, 1]`.
    pub severity: f64,
}

impl Overlap {
    #[inline]
    pub fn involves(&self, id: &ShapeId) -> bool {
        self.a == *id || self.b == *id
    }

    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.shared.binary_search(&node).is_ok()
    }
}

/// Classify a shape pair. Returns the kind, the sorted shared ids and the severity.
///
/// Precedence: identical > nested > edge > partial > vertex > none. The result
/// does not depend on argument order.
pub fn classify(a: &Shape, b: &Shape) -> (OverlapKind, Vec<NodeId>, f64) {
    let mut shared: Vec<NodeId> = a.members.iter().copied().filter(|id| b.contains(*id)).collect();
    shared.sort();
    shared.dedup();
    let n = shared.len();
    if n == 0 || a.members.is_empty() || b.members.is_empty() {
        return (OverlapKind::None, shared, 0.0);
    }
    let (la, lb) = (a.members.len(), b.members.len());
    let severity = (n as f64 / la as f64 + n as f64 / lb as f64) / 2.0;
    let kind = if n == la && n == lb {
        OverlapKind::Identical
    } else if n == la.min(lb) {
        OverlapKind::Nested
    } else if shares_edge(a, b, &shared) {
        OverlapKind::Edge
    } else if n > 2 {
        OverlapKind::Partial
    } else {
        OverlapKind::Vertex
    };
    (kind, shared, severity)
}

/// Some pair of shared members is consecutive on both rings.
fn shares_edge(a: &Shape, b: &Shape, shared: &[NodeId]) -> bool {
    a.ring_pairs()
        .any(|(x, y)| shared.contains(&x) && shared.contains(&y) && b.are_adjacent(x, y))
}

/// All retained overlaps among `shapes`, one per unordered pair.
///
/// `None` is never retained; others are kept when `severity > min_severity`.
/// Each pair is reported with the smaller shape id as `a`.
pub fn detect_overlaps(shapes: &[Shape], min_severity: f64) -> Vec<Overlap> {
    let mut out = Vec::new();
    for (i, a) in shapes.iter().enumerate() {
        for b in &shapes[i + 1..] {
            let (kind, shared, severity) = classify(a, b);
            if kind == OverlapKind::None || severity <= min_severity {
                continue;
            }
            let (lo, hi) = if b.id < a.id { (b, a) } else { (a, b) };
            out.push(Overlap {
                a: lo.id.clone(),
                b: hi.id.clone(),
                kind,
                shared,
                severity,
            });
        }
    }
    out
}
