//! Geometry primitives on `Vec2` (nalgebra `Vector2<f64>`).
//!
//! Purpose
//! - Small, allocation-light helpers shared by the triangulation, the shape
//!   detector and the suggestion engine.
//!
//! Conventions
//! - "Clockwise" is measured in the usual math orientation (y up): points are
//!   ordered by decreasing `atan2` around their centroid.
//! - Every helper guards its degenerate inputs (empty slices, zero-length
//!   arms, collinear triples) and returns a finite fallback instead of NaN.
//!
//! Code cross-refs: `triangulation::bowyer_watson`, `detect`, `suggest::complete`

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

pub type Vec2 = Vector2<f64>;

/// Slack for "is this length zero" checks, relative to the unit of the input.
pub(crate) const LEN_EPS: f64 = 1e-12;

/// Circle given by center and radius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    /// `distance(p, center) <= radius + tol`.
    #[inline]
    pub fn contains(&self, p: Vec2, tol: f64) -> bool {
        distance(p, self.center) <= self.radius + tol
    }
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    (a - b).norm()
}

/// Arithmetic mean of the points; the origin for an empty slice.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::zeros();
    }
    let sum = points.iter().fold(Vec2::zeros(), |acc, p| acc + p);
    sum / points.len() as f64
}

/// Signed area of the polygon (shoelace). Positive for counterclockwise rings.
pub fn signed_area(points: &[Vec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    0.5 * twice
}

/// Orientation of `c` relative to the directed line `a → b` (twice the signed triangle area).
#[inline]
pub fn orient(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Interior angle at `vertex` between the arms towards `a` and `b`, in `[0, π]`.
///
/// Returns 0 when either arm has zero length.
pub fn angle_at(vertex: Vec2, a: Vec2, b: Vec2) -> f64 {
    let u = a - vertex;
    let v = b - vertex;
    let nu = u.norm();
    let nv = v.norm();
    if nu <= LEN_EPS || nv <= LEN_EPS {
        return 0.0;
    }
    (u.dot(&v) / (nu * nv)).clamp(-1.0, 1.0).acos()
}

/// Polar angle of `v` in `(-π, π]`.
#[inline]
pub fn heading(v: Vec2) -> f64 {
    v.y.atan2(v.x)
}

/// Indices of `points` ordered clockwise around their centroid.
///
/// Ties (coincident angles) keep input order, so the result is deterministic.
pub fn sort_clockwise(points: &[Vec2]) -> Vec<usize> {
    let c = centroid(points);
    let mut idx: Vec<usize> = (0..points.len()).collect();
    idx.sort_by(|&i, &j| {
        let ai = heading(points[i] - c);
        let aj = heading(points[j] - c);
        aj.partial_cmp(&ai)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });
    idx
}

/// Circumcircle of the triangle `(a, b, c)` via the determinant formula.
///
/// Near-collinear triples (|det| below `eps` relative to the squared scale) fall
/// back to the centroid and the largest vertex distance from it.
pub fn circumcircle(a: Vec2, b: Vec2, c: Vec2, eps: f64) -> Circle {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let scale = distance(a, b).max(distance(b, c)).max(distance(c, a));
    if d.abs() <= eps * scale * scale.max(1.0) || !d.is_finite() {
        let center = centroid(&[a, b, c]);
        let radius = distance(center, a)
            .max(distance(center, b))
            .max(distance(center, c));
        return Circle { center, radius };
    }
    let a2 = a.norm_squared();
    let b2 = b.norm_squared();
    let c2 = c.norm_squared();
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Vec2::new(ux, uy);
    Circle {
        center,
        radius: distance(center, a),
    }
}

/// Mean distance over all pairs among the first `sample` points; 0 for fewer than two.
pub fn average_pairwise_distance(points: &[Vec2], sample: usize) -> f64 {
    let pts = &points[..points.len().min(sample)];
    if pts.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            sum += distance(pts[i], pts[j]);
            pairs += 1;
        }
    }
    sum / pairs as f64
}

/// Point at distance `r` from `center` in direction `theta`.
#[inline]
pub fn polar(center: Vec2, r: f64, theta: f64) -> Vec2 {
    center + Vec2::new(theta.cos() * r, theta.sin() * r)
}

/// Side lengths of the closed ring `points[0] → points[1] → … → points[0]`.
pub fn side_lengths(points: &[Vec2]) -> Vec<f64> {
    (0..points.len())
        .map(|i| distance(points[i], points[(i + 1) % points.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn circumcircle_right_triangle() {
        let c = circumcircle(vector![0.0, 0.0], vector![2.0, 0.0], vector![0.0, 2.0], 1e-12);
        assert!((c.center - vector![1.0, 1.0]).norm() < 1e-12);
        assert!((c.radius - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn circumcircle_collinear_falls_back_to_centroid() {
        let c = circumcircle(vector![0.0, 0.0], vector![1.0, 0.0], vector![2.0, 0.0], 1e-12);
        assert!((c.center - vector![1.0, 0.0]).norm() < 1e-12);
        assert!((c.radius - 1.0).abs() < 1e-12);
        assert!(c.radius.is_finite());
    }

    #[test]
    fn circumcircle_equidistant_randomized_seeded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let a = Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let b = Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let c = Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            if orient(a, b, c).abs() < 1e-3 {
                continue;
            }
            let circ = circumcircle(a, b, c, 1e-12);
            for p in [a, b, c] {
                assert!((distance(p, circ.center) - circ.radius).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn clockwise_order_of_square() {
        // Input counterclockwise; expect reversed cyclic order.
        let pts = vec![
            vector![1.0, 1.0],
            vector![-1.0, 1.0],
            vector![-1.0, -1.0],
            vector![1.0, -1.0],
        ];
        let order = sort_clockwise(&pts);
        let ring: Vec<Vec2> = order.iter().map(|&i| pts[i]).collect();
        assert!(signed_area(&ring) < 0.0);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn angles_and_guards() {
        let right = angle_at(vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 3.0]);
        assert!((right - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(angle_at(vector![0.0, 0.0], vector![0.0, 0.0], vector![1.0, 0.0]), 0.0);
        assert_eq!(centroid(&[]), Vec2::zeros());
        assert_eq!(average_pairwise_distance(&[vector![1.0, 1.0]], 20), 0.0);
    }

    #[test]
    fn pairwise_distance_respects_sample() {
        let pts = vec![vector![0.0, 0.0], vector![3.0, 4.0], vector![100.0, 0.0]];
        assert!((average_pairwise_distance(&pts, 2) - 5.0).abs() < 1e-12);
    }
}
