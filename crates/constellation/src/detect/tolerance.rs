//! Detector settings and the density-adaptive tolerance.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::cache::Fingerprint;

use crate::geom::{self, Vec2};
use crate::model::Node;

/// How the geometric tolerance is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Derived from the network's spacing (`adaptive_tolerance`).
    #[default]
    Adaptive,
    /// Relative deviation allowed, e.g. `0.2` = 20 %.
    Fixed(f64),
}

/// Shape detector settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectCfg {
    /// Used when adaptivity is off, or when the network has no spacing to sample.
    pub fixed_tolerance: f64,
    pub min_tolerance: f64,
    pub max_tolerance: f64,
    /// Average spacing at (or below) which `min_tolerance` applies.
    pub dense_spacing: f64,
    /// Average spacing at (or above) which `max_tolerance` applies.
    pub sparse_spacing: f64,
    /// Number of leading nodes sampled for the average spacing.
    pub sample_size: usize,
    /// Longest / shortest side bound for triangles.
    pub max_triangle_side_ratio: f64,
    /// Minimum |area| of a triangle relative to its longest side squared.
    pub min_relative_area: f64,
}

impl Default for DetectCfg {
    fn default() -> Self {
        Self {
            fixed_tolerance: 0.25,
            min_tolerance: 0.15,
            max_tolerance: 0.4,
            dense_spacing: 60.0,
            sparse_spacing: 240.0,
            sample_size: 20,
            max_triangle_side_ratio: 3.0,
            min_relative_area: 1e-6,
        }
    }
}

impl DetectCfg {
    /// Resolve a `Tolerance` against a node set.
    pub fn resolve(&self, tolerance: Tolerance, nodes: &[Node]) -> f64 {
        match tolerance {
            Tolerance::Fixed(t) => t.max(0.0),
            Tolerance::Adaptive => adaptive_tolerance(nodes, self),
        }
    }
}

impl Fingerprint for Tolerance {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        match self {
            Tolerance::Adaptive => 0u8.hash(h),
            Tolerance::Fixed(t) => {
                1u8.hash(h);
                t.fingerprint(h);
            }
        }
    }
}

impl Fingerprint for DetectCfg {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        [
            self.fixed_tolerance,
            self.min_tolerance,
            self.max_tolerance,
            self.dense_spacing,
            self.sparse_spacing,
            self.max_triangle_side_ratio,
            self.min_relative_area,
        ][..]
            .fingerprint(h);
        self.sample_size.hash(h);
    }
}

/// Sparser networks get looser tolerance, denser ones stricter.
///
/// Average pairwise distance among the first `sample_size` nodes is mapped
/// linearly from `dense_spacing → min_tolerance` to
/// `sparse_spacing → max_tolerance` and clamped. With no measurable spacing the
/// fixed tolerance is returned.
pub fn adaptive_tolerance(nodes: &[Node], cfg: &DetectCfg) -> f64 {
    let pts: Vec<Vec2> = nodes
        .iter()
        .take(cfg.sample_size)
        .map(|n| n.position)
        .collect();
    let avg = geom::average_pairwise_distance(&pts, cfg.sample_size);
    tolerance_for_spacing(avg, cfg)
}

fn tolerance_for_spacing(avg: f64, cfg: &DetectCfg) -> f64 {
    if !(avg.is_finite()) || avg <= 0.0 {
        return cfg.fixed_tolerance;
    }
    let span = cfg.sparse_spacing - cfg.dense_spacing;
    let t = if span <= 0.0 {
        if avg >= cfg.sparse_spacing {
            1.0
        } else {
            0.0
        }
    } else {
        ((avg - cfg.dense_spacing) / span).clamp(0.0, 1.0)
    };
    cfg.min_tolerance + t * (cfg.max_tolerance - cfg.min_tolerance)
}
