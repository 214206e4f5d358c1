//! Point-level predicates of the validation pipeline.
//!
//! All deviations are relative (a fraction of the mean), so the same tolerance
//! works for any network scale. Every comparison carries `SLACK` so that an
//! exact regular polygon passes even at tolerance 0.

use std::f64::consts::{PI, SQRT_2, TAU};

use crate::geom::{self, Vec2, LEN_EPS};
use crate::model::ShapeKind;

use super::tolerance::DetectCfg;

pub(crate) const SLACK: f64 = 1e-9;

/// Relative deviations of a ring from the regular polygon with the same centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Regularity {
    /// max |r_i − r̄| / r̄ for the distances from the centroid.
    pub radius: f64,
    /// max |θ_i − 2π/n| / (2π/n) for the central angles between neighbors.
    pub turn: f64,
    /// max |s_i − s̄| / s̄ for the side lengths.
    pub side: f64,
}

impl Regularity {
    #[inline]
    pub fn worst(&self) -> f64 {
        self.radius.max(self.turn).max(self.side)
    }
}

/// Points reordered clockwise around their centroid.
pub fn clockwise(points: &[Vec2]) -> Vec<Vec2> {
    geom::sort_clockwise(points)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Deviations of a clockwise ring; `None` for fewer than 3 points or a collapsed ring.
pub fn regularity(ring: &[Vec2]) -> Option<Regularity> {
    let n = ring.len();
    if n < 3 {
        return None;
    }
    let c = geom::centroid(ring);
    let radii: Vec<f64> = ring.iter().map(|p| geom::distance(*p, c)).collect();
    let r_mean = mean(&radii);
    if r_mean <= LEN_EPS {
        return None;
    }
    let radius = max_rel_dev(&radii, r_mean);

    let expected = TAU / n as f64;
    let mut turn: f64 = 0.0;
    for i in 0..n {
        let a = geom::heading(ring[i] - c);
        let b = geom::heading(ring[(i + 1) % n] - c);
        // Clockwise ring: headings decrease.
        let theta = (a - b).rem_euclid(TAU);
        turn = turn.max((theta - expected).abs() / expected);
    }

    let sides = geom::side_lengths(ring);
    let s_mean = mean(&sides);
    if s_mean <= LEN_EPS {
        return None;
    }
    let side = max_rel_dev(&sides, s_mean);
    Some(Regularity { radius, turn, side })
}

/// Basic predicate for 4–6 sided shapes: equal radii and equal central angles.
pub fn is_regular(ring: &[Vec2], tol: f64) -> bool {
    match regularity(ring) {
        Some(r) => r.radius <= tol + SLACK && r.turn <= tol + SLACK,
        None => false,
    }
}

/// Basic predicate for triangles: area not negligible against the longest side.
pub fn has_area(ring: &[Vec2], cfg: &DetectCfg) -> bool {
    let longest = geom::side_lengths(ring).into_iter().fold(0.0, f64::max);
    if longest <= LEN_EPS {
        return false;
    }
    geom::signed_area(ring).abs() > cfg.min_relative_area * longest * longest
}

/// Side-length consistency on a clockwise ring.
pub fn sides_consistent(kind: ShapeKind, ring: &[Vec2], tol: f64, cfg: &DetectCfg) -> bool {
    let sides = geom::side_lengths(ring);
    let shortest = sides.iter().copied().fold(f64::INFINITY, f64::min);
    let longest = sides.iter().copied().fold(0.0, f64::max);
    if shortest <= LEN_EPS {
        return false;
    }
    match kind {
        ShapeKind::Triangle => longest / shortest <= cfg.max_triangle_side_ratio + SLACK,
        _ => max_rel_dev(&sides, mean(&sides)) <= tol + SLACK,
    }
}

/// Interior angles sum to π within `tol` (radians).
pub fn triangle_integrity(ring: &[Vec2], tol: f64) -> bool {
    if ring.len() != 3 {
        return false;
    }
    let sum = geom::angle_at(ring[0], ring[1], ring[2])
        + geom::angle_at(ring[1], ring[2], ring[0])
        + geom::angle_at(ring[2], ring[0], ring[1]);
    (sum - PI).abs() <= tol + SLACK
}

/// Diagonals equal to each other and to side·√2.
pub fn square_integrity(ring: &[Vec2], tol: f64) -> bool {
    if ring.len() != 4 {
        return false;
    }
    let d1 = geom::distance(ring[0], ring[2]);
    let d2 = geom::distance(ring[1], ring[3]);
    let d_max = d1.max(d2);
    if d_max <= LEN_EPS {
        return false;
    }
    if (d1 - d2).abs() / d_max > tol + SLACK {
        return false;
    }
    let expected = mean(&geom::side_lengths(ring)) * SQRT_2;
    if expected <= LEN_EPS {
        return false;
    }
    ((d1 + d2) * 0.5 - expected).abs() / expected <= tol + SLACK
}

/// Full pipeline on unordered points.
pub fn validate_points(kind: ShapeKind, points: &[Vec2], tol: f64, cfg: &DetectCfg) -> bool {
    if points.len() != kind.cardinality()
        || points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return false;
    }
    let ring = clockwise(points);
    match kind {
        ShapeKind::Triangle => {
            has_area(&ring, cfg)
                && sides_consistent(kind, &ring, tol, cfg)
                && triangle_integrity(&ring, tol)
        }
        ShapeKind::Square => {
            is_regular(&ring, tol)
                && sides_consistent(kind, &ring, tol, cfg)
                && square_integrity(&ring, tol)
        }
        ShapeKind::Pentagon | ShapeKind::Hexagon => {
            is_regular(&ring, tol) && sides_consistent(kind, &ring, tol, cfg)
        }
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn max_rel_dev(xs: &[f64], mean: f64) -> f64 {
    if mean <= LEN_EPS {
        return f64::INFINITY;
    }
    xs.iter()
        .map(|x| (x - mean).abs() / mean)
        .fold(0.0, f64::max)
}
