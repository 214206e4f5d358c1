//! Regular-polygon detection with adaptive tolerance.
//!
//! Purpose
//! - Decide whether 3–6 player-placed beacons form a triangle, square,
//!   pentagon or hexagon "closely enough". Placements are never exact, so the
//!   detector accepts bounded relative deviations without accepting arbitrary
//!   clusters.
//!
//! Pipeline (all on the clockwise ring around the centroid)
//! 1. Basic predicate: triangles need non-negligible area; 4–6 sided shapes need
//!    near-equal radii and near-equal central angles.
//! 2. Side consistency: triangles allow longest/shortest ≤ 3; others bound every
//!    side's deviation from the mean side.
//! 3. Integrity: triangle angles sum to π; square diagonals are equal and
//!    match side·√2.
//!
//! Failure semantics
//! - Wrong candidate count, unresolved ids and failed checks all return `false`.
//!
//! Code cross-refs: `finder` (bulk use via `detect_points`), `suggest::complete`.

mod checks;
mod tolerance;

pub use checks::{clockwise, regularity, validate_points, Regularity};
pub use tolerance::{adaptive_tolerance, DetectCfg, Tolerance};

use crate::geom::Vec2;
use crate::model::{Node, NodeId, NodeIndex, ShapeKind};

/// Stateless detector carrying its settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeDetector {
    pub cfg: DetectCfg,
}

impl ShapeDetector {
    pub fn new(cfg: DetectCfg) -> Self {
        Self { cfg }
    }

    /// Tolerance for a node set: adaptive sample or the configured fixed value.
    pub fn tolerance(&self, nodes: &[Node], adaptive: bool) -> f64 {
        if adaptive {
            adaptive_tolerance(nodes, &self.cfg)
        } else {
            self.cfg.fixed_tolerance
        }
    }

    /// Validate `ids` (resolved in `nodes`) as a `kind` polygon.
    pub fn detect(&self, kind: ShapeKind, nodes: &[Node], ids: &[NodeId], adaptive: bool) -> bool {
        if ids.len() != kind.cardinality() {
            return false;
        }
        let index = NodeIndex::new(nodes);
        let Some(points) = index.positions(nodes, ids) else {
            return false;
        };
        let tol = self.tolerance(nodes, adaptive);
        self.detect_points(kind, &points, tol)
    }

    pub fn detect_triangle(&self, nodes: &[Node], ids: &[NodeId], adaptive: bool) -> bool {
        self.detect(ShapeKind::Triangle, nodes, ids, adaptive)
    }

    pub fn detect_square(&self, nodes: &[Node], ids: &[NodeId], adaptive: bool) -> bool {
        self.detect(ShapeKind::Square, nodes, ids, adaptive)
    }

    pub fn detect_pentagon(&self, nodes: &[Node], ids: &[NodeId], adaptive: bool) -> bool {
        self.detect(ShapeKind::Pentagon, nodes, ids, adaptive)
    }

    pub fn detect_hexagon(&self, nodes: &[Node], ids: &[NodeId], adaptive: bool) -> bool {
        self.detect(ShapeKind::Hexagon, nodes, ids, adaptive)
    }

    /// Validate raw positions with an explicit tolerance.
    #[inline]
    pub fn detect_points(&self, kind: ShapeKind, points: &[Vec2], tol: f64) -> bool {
        validate_points(kind, points, tol, &self.cfg)
    }

    /// The kind whose cardinality matches `points.len()`, if those points pass it.
    pub fn classify_points(&self, points: &[Vec2], tol: f64) -> Option<ShapeKind> {
        let kind = ShapeKind::from_cardinality(points.len())?;
        self.detect_points(kind, points, tol).then_some(kind)
    }
}

#[cfg(test)]
mod tests;
