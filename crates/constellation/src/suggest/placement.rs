//! Placement legality collaborator and nudging of illegal positions.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::cache::KeyBuilder;
use crate::geom::{self, Vec2};
use crate::model::{Node, NodeKind};

/// Answer of a placement check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementVerdict {
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl PlacementVerdict {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reasons: Vec::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reasons: vec![reason.into()],
        }
    }
}

/// Host-supplied rule deciding where a node of a given kind may be placed.
pub trait PlacementValidator {
    fn is_valid_position(&self, pos: Vec2, kind: NodeKind) -> PlacementVerdict;

    /// Stable identity of the rule, used in result cache keys. `None` disables caching.
    fn cache_tag(&self) -> Option<u64> {
        None
    }
}

/// Every finite position is legal.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PlacementValidator for AllowAll {
    fn is_valid_position(&self, pos: Vec2, _kind: NodeKind) -> PlacementVerdict {
        if pos.x.is_finite() && pos.y.is_finite() {
            PlacementVerdict::ok()
        } else {
            PlacementVerdict::rejected("position is not finite")
        }
    }

    fn cache_tag(&self) -> Option<u64> {
        Some(0)
    }
}

/// Keeps new nodes `min_distance` away from existing ones and, optionally,
/// inside an axis-aligned `(min, max)` box.
#[derive(Clone, Debug, Default)]
pub struct MinSpacing {
    pub min_distance: f64,
    pub bounds: Option<(Vec2, Vec2)>,
    occupied: Vec<Vec2>,
}

impl MinSpacing {
    pub fn new(nodes: &[Node], min_distance: f64) -> Self {
        Self {
            min_distance,
            bounds: None,
            occupied: nodes.iter().map(|n| n.position).collect(),
        }
    }

    pub fn with_bounds(mut self, min: Vec2, max: Vec2) -> Self {
        self.bounds = Some((min, max));
        self
    }
}

impl PlacementValidator for MinSpacing {
    fn is_valid_position(&self, pos: Vec2, kind: NodeKind) -> PlacementVerdict {
        let mut verdict = AllowAll.is_valid_position(pos, kind);
        if let Some((lo, hi)) = self.bounds {
            if pos.x < lo.x || pos.y < lo.y || pos.x > hi.x || pos.y > hi.y {
                verdict.valid = false;
                verdict.reasons.push("outside placement bounds".to_owned());
            }
        }
        if let Some(p) = self
            .occupied
            .iter()
            .find(|p| geom::distance(**p, pos) < self.min_distance)
        {
            verdict.valid = false;
            verdict
                .reasons
                .push(format!("too close to node at ({:.1}, {:.1})", p.x, p.y));
        }
        verdict
    }

    fn cache_tag(&self) -> Option<u64> {
        let mut key = KeyBuilder::new("min_spacing").add(&self.min_distance);
        if let Some((lo, hi)) = self.bounds {
            key = key.add(&[lo.x, lo.y, hi.x, hi.y][..]);
        }
        for p in &self.occupied {
            key = key.add(&p.x).add(&p.y);
        }
        Some(key.finish().0)
    }
}

/// `pos` itself when legal, else the first legal point on rings of radius
/// `step, 2·step, …, rings·step` around it (8·r samples on ring r).
///
/// The flag is true when the position moved. `None` if nothing legal was found.
pub fn nudge(
    validator: &dyn PlacementValidator,
    pos: Vec2,
    kind: NodeKind,
    step: f64,
    rings: usize,
) -> Option<(Vec2, bool)> {
    if validator.is_valid_position(pos, kind).valid {
        return Some((pos, false));
    }
    if step <= 0.0 {
        return None;
    }
    for r in 1..=rings {
        let samples = 8 * r;
        for k in 0..samples {
            let p = geom::polar(pos, step * r as f64, TAU * k as f64 / samples as f64);
            if validator.is_valid_position(p, kind).valid {
                return Some((p, true));
            }
        }
    }
    None
}
