//! Where the missing members of a partial shape should go.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use crate::detect::ShapeDetector;
use crate::geom::{self, Vec2, LEN_EPS};
use crate::model::ShapeKind;

/// The two apexes completing an equilateral triangle on `a–b`.
pub fn equilateral_apexes(a: Vec2, b: Vec2) -> [Vec2; 2] {
    let mid = (a + b) * 0.5;
    let d = b - a;
    let h = Vec2::new(-d.y, d.x) * (3f64.sqrt() / 2.0);
    [mid + h, mid - h]
}

/// Parallelogram completion of three corners at the corner nearest a right angle.
///
/// Returns the fourth point and the mean length of the two arms at that corner.
pub fn parallelogram_corner(known: &[Vec2]) -> Option<(Vec2, f64)> {
    if known.len() != 3 {
        return None;
    }
    let (i, _) = (0..3)
        .map(|i| {
            let v = known[i];
            let (p, q) = (known[(i + 1) % 3], known[(i + 2) % 3]);
            (i, (geom::angle_at(v, p, q) - FRAC_PI_2).abs())
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    let v = known[i];
    let (p, q) = (known[(i + 1) % 3], known[(i + 2) % 3]);
    let arm = (geom::distance(v, p) + geom::distance(v, q)) / 2.0;
    if arm <= LEN_EPS {
        return None;
    }
    Some((p + q - v, arm))
}

/// Fourth square corner, validated by the detector.
///
/// If the parallelogram point fails, eight directions around it are probed at
/// `fallback_steps[k] × arm` and the first passing point wins.
pub fn square_completion(
    known: &[Vec2],
    detector: &ShapeDetector,
    tol: f64,
    fallback_steps: &[f64],
) -> Option<Vec2> {
    let (primary, arm) = parallelogram_corner(known)?;
    let passes = |p: Vec2| {
        let mut pts = known.to_vec();
        pts.push(p);
        detector.detect_points(ShapeKind::Square, &pts, tol)
    };
    if passes(primary) {
        return Some(primary);
    }
    fallback_steps.iter().find_map(|&step| {
        (0..8)
            .map(|k| geom::polar(primary, step * arm, FRAC_PI_4 * k as f64))
            .find(|p| passes(*p))
    })
}

/// Missing vertices of a regular `kind` polygon through the known points.
///
/// The center is the circumcenter of the first three known points (their
/// centroid when those are collinear, or when fewer are known); the radius is
/// the mean known distance from it. Slots are phase-fitted to the known
/// angles; two known points claiming the same slot means no completion.
pub fn polygon_completion(kind: ShapeKind, known: &[Vec2]) -> Option<Vec<Vec2>> {
    let n = kind.cardinality();
    if known.is_empty() || known.len() >= n {
        return None;
    }
    let center = if known.len() >= 3 {
        geom::circumcircle(known[0], known[1], known[2], 1e-9).center
    } else {
        geom::centroid(known)
    };
    let radius =
        known.iter().map(|p| geom::distance(*p, center)).sum::<f64>() / known.len() as f64;
    if !(radius.is_finite() && radius > LEN_EPS) {
        return None;
    }
    let step = TAU / n as f64;
    let angles: Vec<f64> = known.iter().map(|p| geom::heading(*p - center)).collect();
    // Circular mean of n·θ recovers the common phase modulo one slot.
    let (s, c) = angles.iter().fold((0.0, 0.0), |(s, c), a| {
        let (sin, cos) = (n as f64 * a).sin_cos();
        (s + sin, c + cos)
    });
    let phase = s.atan2(c) / n as f64;
    let mut taken = vec![false; n];
    for a in &angles {
        let slot = ((a - phase) / step).round().rem_euclid(n as f64) as usize % n;
        if taken[slot] {
            return None;
        }
        taken[slot] = true;
    }
    Some(
        (0..n)
            .filter(|k| !taken[*k])
            .map(|k| geom::polar(center, radius, phase + step * k as f64))
            .collect(),
    )
}

/// Alternative completions (each a list of missing positions) for `known` as a `kind`.
pub fn completions(
    kind: ShapeKind,
    known: &[Vec2],
    detector: &ShapeDetector,
    tol: f64,
    fallback_steps: &[f64],
) -> Vec<Vec<Vec2>> {
    match (kind, known.len()) {
        (ShapeKind::Triangle, 2) => equilateral_apexes(known[0], known[1])
            .into_iter()
            .map(|p| vec![p])
            .collect(),
        (ShapeKind::Square, 3) => square_completion(known, detector, tol, fallback_steps)
            .map(|p| vec![p])
            .into_iter()
            .collect(),
        (ShapeKind::Pentagon | ShapeKind::Hexagon, _) => {
            polygon_completion(kind, known).into_iter().collect()
        }
        _ => Vec::new(),
    }
}
