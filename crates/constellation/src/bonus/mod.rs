//! Network bonus multiplier from confirmed shapes.
//!
//! Purpose
//! - Fold every confirmed shape into one production multiplier, penalizing
//!   shapes that reuse the same beacons and weighting beacons by level, degree
//!   and kind.
//!
//! Pipeline
//! 1. Pairwise overlaps (`overlap`), filtered by severity.
//! 2. Per-node contributions: combined base bonuses × type weight × connection
//!    quality × blended overlap modifiers (`aggregate`).
//! 3. Stacking strategy → raw multiplier; floor at 1, diminishing returns,
//!    optional cap.
//! 4. Per-shape breakdown and resource rates.
//!
//! The calculation is a pure function of `(shapes, nodes, config)`.
//!
//! Code cross-refs: `engine::PatternEngine::calculate` (cached entry point).

mod aggregate;
mod config;
mod overlap;
mod validate;

pub use aggregate::{combine_bases, node_contributions, post_process, stack, NodeContribution};
pub use config::{
    BonusConfig, OverlapModifiers, ResourceKind, ResourceRate, StackingStrategy, TypeWeights,
};
pub use overlap::{classify, detect_overlaps, Overlap, OverlapKind};
pub use validate::{validate, BonusValidation, ValidationIssue, SANITY_BOUND};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Node, Shape, ShapeId, ShapeKind};

/// One shape's line in the breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeBreakdown {
    pub shape: ShapeId,
    pub kind: ShapeKind,
    pub base_bonus: f64,
    pub overlap_count: usize,
    /// Base bonus times the blended modifiers of every overlap it takes part in.
    pub effective_bonus: f64,
    /// Fraction of the summed `effective_bonus - 1` owned by this shape.
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusResult {
    pub strategy: StackingStrategy,
    /// Final multiplier, always `>= 1` for finite input.
    pub multiplier: f64,
    /// Strategy output before floor, diminishing returns and cap.
    pub raw_multiplier: f64,
    pub contributions: Vec<NodeContribution>,
    pub overlaps: Vec<Overlap>,
    pub shapes: Vec<ShapeBreakdown>,
    pub resource_rates: BTreeMap<ResourceKind, f64>,
}

impl BonusResult {
    pub fn validate(&self) -> BonusValidation {
        validate(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct BonusCalculator {
    pub cfg: BonusConfig,
}

impl BonusCalculator {
    pub fn new(cfg: BonusConfig) -> Self {
        Self { cfg }
    }

    pub fn calculate(&self, shapes: &[Shape], nodes: &[Node]) -> BonusResult {
        calculate(shapes, nodes, &self.cfg)
    }
}

/// Compute the multiplier and its breakdown.
pub fn calculate(shapes: &[Shape], nodes: &[Node], cfg: &BonusConfig) -> BonusResult {
    let overlaps = detect_overlaps(shapes, cfg.min_overlap_threshold);
    let contributions = node_contributions(shapes, nodes, &overlaps, cfg);
    let raw_multiplier = stack(cfg.strategy, &contributions);
    let multiplier = post_process(raw_multiplier, cfg);
    let breakdown = shape_breakdown(shapes, &overlaps, cfg);
    let resource_rates = resource_rates(multiplier, cfg);
    debug!(
        shapes = shapes.len(),
        overlaps = overlaps.len(),
        contributions = contributions.len(),
        raw = raw_multiplier,
        multiplier,
        strategy = ?cfg.strategy,
        "bonus calculated"
    );
    BonusResult {
        strategy: cfg.strategy,
        multiplier,
        raw_multiplier,
        contributions,
        overlaps,
        shapes: breakdown,
        resource_rates,
    }
}

fn shape_breakdown(shapes: &[Shape], overlaps: &[Overlap], cfg: &BonusConfig) -> Vec<ShapeBreakdown> {
    let mut rows: Vec<ShapeBreakdown> = shapes
        .iter()
        .map(|s| {
            let mine: Vec<&Overlap> = overlaps.iter().filter(|o| o.involves(&s.id)).collect();
            let factor: f64 = mine
                .iter()
                .map(|o| cfg.overlap_modifiers.blended(o.kind, o.severity))
                .product();
            ShapeBreakdown {
                shape: s.id.clone(),
                kind: s.kind,
                base_bonus: s.base_bonus,
                overlap_count: mine.len(),
                effective_bonus: s.base_bonus * factor,
                share: 0.0,
            }
        })
        .collect();
    let excess: f64 = rows.iter().map(|r| (r.effective_bonus - 1.0).max(0.0)).sum();
    if excess > 0.0 {
        for r in &mut rows {
            r.share = (r.effective_bonus - 1.0).max(0.0) / excess;
        }
    }
    rows
}

/// Per-resource production rate under `multiplier`.
pub fn resource_rates(multiplier: f64, cfg: &BonusConfig) -> BTreeMap<ResourceKind, f64> {
    cfg.resources
        .iter()
        .map(|(kind, r)| {
            let rate = if cfg.target_resource_types.contains(kind) {
                r.base_rate * (1.0 + (multiplier - 1.0) * r.weight)
            } else {
                r.base_rate
            };
            (*kind, rate)
        })
        .collect()
}

#[cfg(test)]
mod tests;
