//! Per-node contributions and the stacking strategies that fold them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Node, NodeId, NodeIndex, Shape, ShapeId};

use super::config::{BonusConfig, StackingStrategy};
use super::overlap::Overlap;

/// Smallest node weight; keeps normalization finite.
const MIN_WEIGHT: f64 = 1e-6;
/// Multipliers are clamped here before taking logarithms.
const MIN_MULTIPLIER: f64 = 1e-9;

/// What one node contributes to the network multiplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeContribution {
    pub node: NodeId,
    pub shapes: Vec<ShapeId>,
    /// Base bonuses of `shapes` combined per the strategy.
    pub base: f64,
    pub type_weight: f64,
    pub quality_weight: f64,
    /// Product of blended overlap modifiers touching this node.
    pub overlap_factor: f64,
    /// `base * type_weight * quality_weight * overlap_factor`.
    pub multiplier: f64,
    /// Aggregation weight, `level * sqrt(connections + 1) * type_weight`.
    pub weight: f64,
}

/// Combine a node's shape base bonuses.
pub fn combine_bases(strategy: StackingStrategy, bases: &[f64]) -> f64 {
    match strategy {
        StackingStrategy::Multiplicative | StackingStrategy::Weighted => bases.iter().product(),
        StackingStrategy::Additive => 1.0 + bases.iter().map(|b| b - 1.0).sum::<f64>(),
        StackingStrategy::Maximum => bases.iter().copied().fold(1.0, f64::max),
    }
}

/// One contribution per node that belongs to at least one shape, sorted by id.
///
/// Shape members that do not resolve in `nodes` are skipped.
pub fn node_contributions(
    shapes: &[Shape],
    nodes: &[Node],
    overlaps: &[Overlap],
    cfg: &BonusConfig,
) -> Vec<NodeContribution> {
    let index = NodeIndex::new(nodes);
    let mut membership: BTreeMap<NodeId, Vec<&Shape>> = BTreeMap::new();
    for s in shapes {
        for &id in &s.members {
            membership.entry(id).or_default().push(s);
        }
    }
    membership
        .into_iter()
        .filter_map(|(id, member_of)| {
            let node = index.get(nodes, id)?;
            let bases: Vec<f64> = member_of.iter().map(|s| s.base_bonus).collect();
            let base = combine_bases(cfg.strategy, &bases);
            let type_weight = cfg.type_weights.get(node.kind);
            let level = node.effective_level();
            let links = node.connections.len();
            let quality_weight = cfg.quality_weight(level, links);
            let overlap_factor: f64 = overlaps
                .iter()
                .filter(|o| o.touches(id))
                .map(|o| cfg.overlap_modifiers.blended(o.kind, o.severity))
                .product();
            let weight =
                (level as f64 * ((links + 1) as f64).sqrt() * type_weight).max(MIN_WEIGHT);
            Some(NodeContribution {
                node: id,
                shapes: member_of.iter().map(|s| s.id.clone()).collect(),
                base,
                type_weight,
                quality_weight,
                overlap_factor,
                multiplier: base * type_weight * quality_weight * overlap_factor,
                weight,
            })
        })
        .collect()
}

/// Fold contributions into the raw network multiplier (before post-processing).
///
/// No contributions yields `1.0`.
pub fn stack(strategy: StackingStrategy, contributions: &[NodeContribution]) -> f64 {
    let total: f64 = contributions.iter().map(|c| c.weight).sum();
    if contributions.is_empty() || total <= 0.0 || !total.is_finite() {
        return 1.0;
    }
    let share = |c: &NodeContribution| c.weight / total;
    match strategy {
        StackingStrategy::Multiplicative => contributions
            .iter()
            .map(|c| share(c) * c.multiplier.max(MIN_MULTIPLIER).ln())
            .sum::<f64>()
            .exp(),
        StackingStrategy::Additive => {
            1.0 + contributions
                .iter()
                .map(|c| share(c) * (c.multiplier - 1.0))
                .sum::<f64>()
        }
        StackingStrategy::Maximum => contributions
            .iter()
            .map(|c| c.multiplier)
            .fold(f64::NEG_INFINITY, f64::max),
        StackingStrategy::Weighted => {
            let (low, high): (Vec<&NodeContribution>, Vec<&NodeContribution>) =
                contributions.iter().partition(|c| c.multiplier <= 2.0);
            let geometric: f64 = low
                .iter()
                .map(|c| c.multiplier.max(MIN_MULTIPLIER).powf(share(c)))
                .product();
            let additive: f64 = high.iter().map(|c| share(c) * (c.multiplier - 1.0)).sum();
            geometric + additive
        }
    }
}

/// Floor at 1, diminishing returns above the threshold, then the optional cap.
pub fn post_process(raw: f64, cfg: &BonusConfig) -> f64 {
    let mut m = if raw.is_nan() { 1.0 } else { raw.max(1.0) };
    let t = cfg.diminishing_returns_threshold;
    if t > 0.0 && m > t {
        m = t + (m - t) * cfg.diminishing_returns_factor;
    }
    if cfg.max_multiplier_cap > 0.0 {
        m = m.min(cfg.max_multiplier_cap);
    }
    m
}
