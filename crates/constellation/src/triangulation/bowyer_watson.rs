//! Bowyer–Watson incremental insertion with a super-triangle.

use std::collections::{BTreeMap, HashSet};

use crate::geom::{self, Vec2, LEN_EPS};
use crate::model::{Node, NodeId};

use super::types::{Mesh, MeshEdge, NeighborMap, Triangle, Triangulation, TriangulationCfg};

/// Circumcircle degeneracy threshold (relative determinant).
const DET_EPS: f64 = 1e-12;

/// Delaunay triangulation of the node positions plus the derived neighbor map.
///
/// Fewer than three distinct positions yield an empty result. Never fails.
pub fn triangulate(nodes: &[Node], cfg: TriangulationCfg) -> Triangulation {
    let (points, ids) = accept_points(nodes, cfg.max_points);
    if points.len() < 3 {
        return Triangulation::default();
    }
    let mut builder = Builder::new(points, ids, cfg);
    builder.insert_all();
    let tri = builder.finish();
    tracing::debug!(
        points = tri.mesh.ids.len(),
        triangles = tri.mesh.triangles.len(),
        edges = tri.mesh.edges.len(),
        "triangulated"
    );
    tri
}

/// First `max_points` distinct positions in input order.
fn accept_points(nodes: &[Node], max_points: usize) -> (Vec<Vec2>, Vec<NodeId>) {
    let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(nodes.len());
    let mut points = Vec::new();
    let mut ids = Vec::new();
    for n in nodes {
        if points.len() >= max_points {
            break;
        }
        let p = n.position;
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        if seen.insert((p.x.to_bits(), p.y.to_bits())) {
            points.push(p);
            ids.push(n.id);
        }
    }
    (points, ids)
}

/// Equilateral triangle whose incircle circumscribes the expanded bounding box.
fn super_triangle(points: &[Vec2], expansion: f64) -> [Vec2; 3] {
    let (mut min, mut max) = (points[0], points[0]);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let span = (max.x - min.x).max(max.y - min.y).max(LEN_EPS);
    let margin = expansion.max(0.0) * span + LEN_EPS;
    let lo = min - Vec2::new(margin, margin);
    let hi = max + Vec2::new(margin, margin);
    let center = (lo + hi) * 0.5;
    // Incircle radius = half diagonal; an equilateral triangle's circumradius is twice that.
    let r = (hi - lo).norm() * 0.5 * 2.0;
    let base = std::f64::consts::FRAC_PI_2;
    let step = std::f64::consts::TAU / 3.0;
    [
        geom::polar(center, r, base),
        geom::polar(center, r, base + step),
        geom::polar(center, r, base + 2.0 * step),
    ]
}

struct Builder {
    points: Vec<Vec2>,
    ids: Vec<NodeId>,
    cfg: TriangulationCfg,
    triangles: Vec<Triangle>,
}

impl Builder {
    fn new(mut points: Vec<Vec2>, ids: Vec<NodeId>, cfg: TriangulationCfg) -> Self {
        let n = points.len();
        let corners = super_triangle(&points, cfg.expansion);
        points.extend_from_slice(&corners);
        let mut b = Self {
            points,
            ids,
            cfg,
            triangles: Vec::new(),
        };
        let first = b.make_triangle(n, n + 1, n + 2);
        b.triangles.push(first);
        b
    }

    /// Triangle with counterclockwise vertex order and its circumcircle.
    fn make_triangle(&self, a: usize, b: usize, c: usize) -> Triangle {
        let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
        let vertices = if geom::orient(pa, pb, pc) >= 0.0 {
            [a, b, c]
        } else {
            [a, c, b]
        };
        let circle = geom::circumcircle(pa, pb, pc, DET_EPS);
        Triangle {
            vertices,
            circumcenter: circle.center,
            circumradius: circle.radius,
            neighbors: [None; 3],
        }
    }

    fn insert_all(&mut self) {
        for i in 0..self.ids.len() {
            self.insert(i);
        }
    }

    fn insert(&mut self, pid: usize) {
        let p = self.points[pid];
        let tol = self.cfg.tolerance;
        let bad: Vec<bool> = self
            .triangles
            .iter()
            .map(|t| geom::distance(p, t.circumcenter) <= t.circumradius + tol)
            .collect();
        if !bad.iter().any(|&b| b) {
            tracing::trace!(pid, "point outside every circumcircle; skipped");
            return;
        }

        // Cavity boundary: edges used by exactly one bad triangle, kept with the
        // orientation they had in that triangle.
        let mut edge_use: BTreeMap<(usize, usize), (usize, (usize, usize))> = BTreeMap::new();
        for (t, _) in self.triangles.iter().zip(&bad).filter(|(_, b)| **b) {
            for (u, v) in t.edges() {
                let key = (u.min(v), u.max(v));
                edge_use.entry(key).or_insert((0, (u, v))).0 += 1;
            }
        }

        let mut keep = bad.iter().map(|b| !b);
        self.triangles.retain(|_| keep.next().unwrap_or(true));

        for (count, (u, v)) in edge_use.into_values() {
            if count != 1 {
                continue;
            }
            let t = self.make_triangle(u, v, pid);
            self.triangles.push(t);
        }
    }

    fn finish(mut self) -> Triangulation {
        let n = self.ids.len();
        if !self.cfg.keep_super_triangle {
            self.triangles.retain(|t| t.vertices.iter().all(|&v| v < n));
        }

        let mut edges: Vec<MeshEdge> = Vec::new();
        let mut edge_index: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut point_triangles = vec![Vec::new(); self.points.len()];
        for (ti, t) in self.triangles.iter().enumerate() {
            for &v in &t.vertices {
                point_triangles[v].push(ti);
            }
            for (u, v) in t.edges() {
                let key = (u.min(v), u.max(v));
                match edge_index.get(&key) {
                    Some(&e) => edges[e].triangles[1] = Some(ti),
                    None => {
                        edge_index.insert(key, edges.len());
                        edges.push(MeshEdge {
                            a: key.0,
                            b: key.1,
                            triangles: [Some(ti), None],
                            hull: false,
                        });
                    }
                }
            }
        }
        for e in edges.iter_mut() {
            e.hull = e.triangles[1].is_none();
        }
        for ti in 0..self.triangles.len() {
            let tri_edges = self.triangles[ti].edges();
            for (k, (u, v)) in tri_edges.into_iter().enumerate() {
                let e = &edges[edge_index[&(u.min(v), u.max(v))]];
                self.triangles[ti].neighbors[k] =
                    e.triangles.iter().flatten().copied().find(|&o| o != ti);
            }
        }

        let mesh = Mesh {
            points: self.points,
            ids: self.ids,
            triangles: self.triangles,
            edges,
            point_triangles,
        };
        let mut neighbors: NeighborMap = mesh
            .ids
            .iter()
            .map(|id| (*id, Default::default()))
            .collect();
        for e in &mesh.edges {
            if mesh.is_input_point(e.a) && mesh.is_input_point(e.b) {
                let (ia, ib) = (mesh.ids[e.a], mesh.ids[e.b]);
                neighbors.entry(ia).or_default().insert(ib);
                neighbors.entry(ib).or_default().insert(ia);
            }
        }

        Triangulation { mesh, neighbors }
    }
}
