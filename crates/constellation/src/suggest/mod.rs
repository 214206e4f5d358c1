//! Completion hints: near-complete shapes and where the next beacon should go.
//!
//! Purpose
//! - Find connected node groups that already hold most of a regular polygon
//!   and propose the positions that would complete them, ranked by payoff.
//!
//! Model
//! - Candidates are the anchor plus subsets of its 2-hop connection
//!   neighborhood (nearest `neighborhood_limit` nodes). A subset must be
//!   connected in the connection graph and hold at least the per-kind fraction
//!   of members, but not all of them. Each anchor draws at most
//!   `max_combinations` subsets.
//! - Subsets that mostly repeat an existing shape (id overlap ≥
//!   `existing_overlap`) are skipped.
//! - Missing positions go through the placement collaborator; illegal ones are
//!   nudged, and a pattern with any position that cannot be nudged is dropped.
//! - Suggestions at (nearly) the same position are merged and boosted, since
//!   one beacon there completes several shapes.
//!
//! Code cross-refs: `complete` (geometry), `placement` (legality), `finder::combinations`.

mod complete;
mod placement;

pub use complete::{
    completions, equilateral_apexes, parallelogram_corner, polygon_completion, square_completion,
};
pub use placement::{nudge, AllowAll, MinSpacing, PlacementValidator, PlacementVerdict};

use std::collections::{BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::Fingerprint;
use crate::detect::{DetectCfg, ShapeDetector, Tolerance};
use crate::finder::{combinations, Adjacency};
use crate::geom::{self, Vec2};
use crate::model::{
    derive_connections, IncompletePattern, Node, NodeId, NodeIndex, NodeKind, Shape, ShapeKind,
};

/// Suggestion engine settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestCfg {
    /// Minimum fraction of members present, for triangle, square, pentagon, hexagon.
    pub thresholds: [f64; 4],
    pub neighborhood_limit: usize,
    /// Subset budget per anchor.
    pub max_combinations: usize,
    /// Candidates sharing at least this fraction of ids with an existing shape are skipped.
    pub existing_overlap: f64,
    /// Square fallback probe radii, in units of the known side.
    pub fallback_steps: [f64; 3],
    pub nudge_step: f64,
    pub nudge_rings: usize,
    /// Positions closer than this are one suggestion.
    pub group_tolerance: f64,
    pub multi_shape_boost: f64,
    pub max_suggestions: usize,
    /// Kind handed to the placement collaborator.
    pub node_kind: NodeKind,
    pub tolerance: Tolerance,
    pub detect: DetectCfg,
}

impl Default for SuggestCfg {
    fn default() -> Self {
        Self {
            thresholds: [2.0 / 3.0, 3.0 / 4.0, 3.0 / 5.0, 4.0 / 6.0],
            neighborhood_limit: 8,
            max_combinations: 1000,
            existing_overlap: 0.8,
            fallback_steps: [0.1, 0.2, 0.35],
            nudge_step: 15.0,
            nudge_rings: 6,
            group_tolerance: 5.0,
            multi_shape_boost: 0.25,
            max_suggestions: 10,
            node_kind: NodeKind::Standard,
            tolerance: Tolerance::Adaptive,
            detect: DetectCfg::default(),
        }
    }
}

impl SuggestCfg {
    #[inline]
    pub fn threshold(&self, kind: ShapeKind) -> f64 {
        self.thresholds[kind.cardinality() - 3]
    }

    /// Member counts that qualify as "near complete" for `kind`.
    pub fn present_counts(&self, kind: ShapeKind) -> std::ops::Range<usize> {
        let n = kind.cardinality();
        let min = ((self.threshold(kind) * n as f64) - 1e-9).ceil().max(2.0) as usize;
        min..n
    }
}

impl Fingerprint for SuggestCfg {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.thresholds[..].fingerprint(h);
        self.fallback_steps[..].fingerprint(h);
        [
            self.existing_overlap,
            self.nudge_step,
            self.group_tolerance,
            self.multi_shape_boost,
        ][..]
            .fingerprint(h);
        self.neighborhood_limit.hash(h);
        self.max_combinations.hash(h);
        self.nudge_rings.hash(h);
        self.max_suggestions.hash(h);
        self.node_kind.hash(h);
        self.tolerance.fingerprint(h);
        self.detect.fingerprint(h);
    }
}

/// One ranked placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub position: Vec2,
    /// Indices into `SuggestionReport::incomplete_patterns` this position serves.
    pub patterns: Vec<usize>,
    pub kinds: Vec<ShapeKind>,
    /// Best single-pattern score times the multi-shape boost.
    pub score: f64,
    pub nudged: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionReport {
    pub incomplete_patterns: Vec<IncompletePattern>,
    pub suggestions: Vec<Suggestion>,
    pub best_next_position: Option<Vec2>,
    /// `1 + Σ (base - 1) · feasibility` over the incomplete patterns.
    pub aggregate_potential_bonus: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SuggestionEngine {
    pub cfg: SuggestCfg,
}

impl SuggestionEngine {
    pub fn new(cfg: SuggestCfg) -> Self {
        Self { cfg }
    }

    pub fn analyze(
        &self,
        nodes: &[Node],
        existing: &[Shape],
        validator: &dyn PlacementValidator,
    ) -> SuggestionReport {
        let patterns = self.incomplete_patterns(nodes, existing, validator);
        let suggestions = self.rank(&patterns);
        let aggregate_potential_bonus = 1.0
            + patterns
                .iter()
                .map(|p| (p.kind.base_bonus() - 1.0) * p.feasibility)
                .sum::<f64>();
        debug!(
            nodes = nodes.len(),
            patterns = patterns.len(),
            suggestions = suggestions.len(),
            potential = aggregate_potential_bonus,
            "suggestions computed"
        );
        SuggestionReport {
            best_next_position: suggestions.first().map(|s| s.position),
            incomplete_patterns: patterns,
            suggestions,
            aggregate_potential_bonus,
        }
    }

    /// Near-complete groups with their legal completion positions.
    pub fn incomplete_patterns(
        &self,
        nodes: &[Node],
        existing: &[Shape],
        validator: &dyn PlacementValidator,
    ) -> Vec<IncompletePattern> {
        let cfg = &self.cfg;
        let connections = derive_connections(nodes);
        let adj = Adjacency::from_connections(nodes, &connections);
        let index = NodeIndex::new(nodes);
        let detector = ShapeDetector::new(cfg.detect);
        let tol = cfg.detect.resolve(cfg.tolerance, nodes);
        let existing_keys: Vec<BTreeSet<NodeId>> = existing
            .iter()
            .map(|s| s.members.iter().copied().collect())
            .collect();

        let mut seen: BTreeSet<(ShapeKind, Vec<NodeId>)> = BTreeSet::new();
        let mut out = Vec::new();
        for anchor in adj.nodes() {
            let around = self.neighborhood(&adj, nodes, &index, anchor);
            let mut budget = cfg.max_combinations;
            'kinds: for kind in ShapeKind::ALL {
                for present in cfg.present_counts(kind) {
                    if budget == 0 {
                        break 'kinds;
                    }
                    let picks = combinations(&around, present - 1, budget);
                    budget -= picks.len();
                    for mut ids in picks {
                        ids.push(anchor);
                        ids.sort();
                        if !seen.insert((kind, ids.clone())) {
                            continue;
                        }
                        if !connected(&adj, &ids)
                            || mostly_existing(&ids, &existing_keys, cfg.existing_overlap)
                        {
                            continue;
                        }
                        out.extend(self.complete_group(
                            kind, &ids, nodes, &index, &detector, tol, validator,
                        ));
                    }
                }
            }
        }
        out
    }

    /// Nearest nodes within two hops of `anchor`, excluding it.
    fn neighborhood(
        &self,
        adj: &Adjacency,
        nodes: &[Node],
        index: &NodeIndex,
        anchor: NodeId,
    ) -> Vec<NodeId> {
        let mut reach: BTreeSet<NodeId> = BTreeSet::new();
        for a in adj.neighbors(anchor) {
            reach.insert(a);
            reach.extend(adj.neighbors(a));
        }
        reach.remove(&anchor);
        let Some(origin) = index.get(nodes, anchor).map(|n| n.position) else {
            return Vec::new();
        };
        let mut near: Vec<(f64, NodeId)> = reach
            .into_iter()
            .filter_map(|id| {
                index
                    .get(nodes, id)
                    .map(|n| (geom::distance(origin, n.position), id))
            })
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        near.truncate(self.cfg.neighborhood_limit);
        let mut ids: Vec<NodeId> = near.into_iter().map(|(_, id)| id).collect();
        ids.sort();
        ids
    }

    #[allow(clippy::too_many_arguments)]
    fn complete_group(
        &self,
        kind: ShapeKind,
        ids: &[NodeId],
        nodes: &[Node],
        index: &NodeIndex,
        detector: &ShapeDetector,
        tol: f64,
        validator: &dyn PlacementValidator,
    ) -> Vec<IncompletePattern> {
        let cfg = &self.cfg;
        let Some(known) = index.positions(nodes, ids) else {
            return Vec::new();
        };
        let scale = geom::average_pairwise_distance(&known, known.len());
        if scale <= geom::LEN_EPS {
            return Vec::new();
        }
        let mut out = Vec::new();
        let alternatives = completions(kind, &known, detector, tol, &cfg.fallback_steps);
        'alternatives: for missing in alternatives {
            let mut full = known.clone();
            full.extend(missing.iter().copied());
            if !detector.detect_points(kind, &full, tol) {
                continue;
            }
            let mut placed = Vec::with_capacity(missing.len());
            let mut nudged = false;
            for p in missing {
                if nodes.iter().any(|n| geom::distance(n.position, p) < cfg.group_tolerance) {
                    continue 'alternatives;
                }
                let nudged_to = nudge(validator, p, cfg.node_kind, cfg.nudge_step, cfg.nudge_rings);
                let Some((q, moved)) = nudged_to else {
                    continue 'alternatives;
                };
                nudged |= moved;
                placed.push(q);
            }
            let ratio = ids.len() as f64 / kind.cardinality() as f64;
            let feasibility = (ratio * if nudged { 0.8 } else { 1.0 }).clamp(0.0, 1.0);
            let reach = placed
                .iter()
                .map(|p| {
                    known
                        .iter()
                        .map(|k| geom::distance(*k, *p))
                        .fold(f64::INFINITY, f64::min)
                })
                .sum::<f64>()
                / placed.len().max(1) as f64;
            out.push(IncompletePattern {
                kind,
                members: ids.to_vec(),
                missing: placed,
                feasibility,
                proximity: 1.0 / (1.0 + reach / scale),
                nudged,
            });
        }
        out
    }

    /// Score every missing position, merge near-identical ones, rank.
    pub fn rank(&self, patterns: &[IncompletePattern]) -> Vec<Suggestion> {
        let cfg = &self.cfg;
        let mut scored: Vec<(f64, Vec2, usize)> = Vec::new();
        for (i, p) in patterns.iter().enumerate() {
            for pos in &p.missing {
                scored.push((score(p), *pos, i));
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.2.cmp(&b.2)));

        let mut groups: Vec<(Suggestion, f64)> = Vec::new();
        for (s, pos, i) in scored {
            let p = &patterns[i];
            match groups
                .iter_mut()
                .find(|(g, _)| geom::distance(g.position, pos) <= cfg.group_tolerance)
            {
                Some((g, _)) => {
                    if !g.patterns.contains(&i) {
                        g.patterns.push(i);
                        g.kinds.push(p.kind);
                        g.nudged |= p.nudged;
                    }
                }
                None => groups.push((
                    Suggestion {
                        position: pos,
                        patterns: vec![i],
                        kinds: vec![p.kind],
                        score: s,
                        nudged: p.nudged,
                    },
                    s,
                )),
            }
        }
        let mut out: Vec<Suggestion> = groups
            .into_iter()
            .map(|(mut g, best)| {
                let extra = g.patterns.len() as f64 - 1.0;
                g.score = best * (1.0 + cfg.multi_shape_boost * extra);
                g
            })
            .collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        out.truncate(cfg.max_suggestions);
        out
    }
}

/// `0.35·bonus/3 + 0.3·feasibility + 0.2·proximity + 0.15·efficiency`.
pub fn score(p: &IncompletePattern) -> f64 {
    let bonus = p.kind.base_bonus();
    let efficiency = (bonus - 1.0) / p.missing.len().max(1) as f64 / 2.0;
    0.35 * bonus / 3.0 + 0.3 * p.feasibility + 0.2 * p.proximity + 0.15 * efficiency
}

/// The induced subgraph on `ids` is connected.
fn connected(adj: &Adjacency, ids: &[NodeId]) -> bool {
    let Some(&first) = ids.first() else {
        return false;
    };
    let mut seen = BTreeSet::from([first]);
    let mut queue = VecDeque::from([first]);
    while let Some(a) = queue.pop_front() {
        for b in adj.neighbors(a) {
            if ids.contains(&b) && seen.insert(b) {
                queue.push_back(b);
            }
        }
    }
    seen.len() == ids.len()
}

fn mostly_existing(ids: &[NodeId], existing: &[BTreeSet<NodeId>], limit: f64) -> bool {
    existing.iter().any(|s| {
        let shared = ids.iter().filter(|id| s.contains(id)).count();
        shared as f64 / ids.len() as f64 >= limit
    })
}
