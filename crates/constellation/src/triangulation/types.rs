//! Mesh types and triangulation settings.
//!
//! Kept small and explicit so `bowyer_watson` reads as the algorithm only.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::cache::Fingerprint;
use crate::geom::Vec2;
use crate::model::NodeId;

/// Node id → ids sharing a mesh edge with it.
pub type NeighborMap = BTreeMap<NodeId, BTreeSet<NodeId>>;

/// Triangulation settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationCfg {
    /// Points beyond this count are dropped (by input order).
    pub max_points: usize,
    /// Slack in the in-circumcircle test.
    pub tolerance: f64,
    /// Bounding box is expanded by this multiple of its larger side before the
    /// super-triangle is fitted around it.
    pub expansion: f64,
    /// Keep triangles touching the super-triangle (diagnostics only).
    pub keep_super_triangle: bool,
}

impl Default for TriangulationCfg {
    fn default() -> Self {
        Self {
            max_points: 500,
            tolerance: 1e-10,
            expansion: 2.0,
            keep_super_triangle: false,
        }
    }
}

impl Fingerprint for TriangulationCfg {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.max_points.hash(h);
        self.tolerance.fingerprint(h);
        self.expansion.fingerprint(h);
        self.keep_super_triangle.hash(h);
    }
}

/// Mesh triangle. `neighbors[i]` is across the edge `vertices[i] → vertices[(i+1)%3]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Indices into `Mesh::points`, counterclockwise.
    pub vertices: [usize; 3],
    pub circumcenter: Vec2,
    pub circumradius: f64,
    pub neighbors: [Option<usize>; 3],
}

impl Triangle {
    #[inline]
    pub fn has_vertex(&self, v: usize) -> bool {
        self.vertices.contains(&v)
    }

    #[inline]
    pub fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Mesh edge with up to two adjacent triangles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshEdge {
    pub a: usize,
    pub b: usize,
    pub triangles: [Option<usize>; 2],
    /// Only one adjacent triangle.
    pub hull: bool,
}

/// Triangulated point set.
///
/// `points` holds the accepted input points first (`0..ids.len()`), followed by
/// the three super-triangle corners.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub points: Vec<Vec2>,
    pub ids: Vec<NodeId>,
    pub triangles: Vec<Triangle>,
    pub edges: Vec<MeshEdge>,
    /// Point index → ids of triangles using it.
    pub point_triangles: Vec<Vec<usize>>,
}

impl Mesh {
    /// True for indices of accepted input points (not super-triangle corners).
    #[inline]
    pub fn is_input_point(&self, i: usize) -> bool {
        i < self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn hull_edges(&self) -> impl Iterator<Item = &MeshEdge> {
        self.edges.iter().filter(|e| e.hull)
    }
}

/// Result of `triangulate`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    pub mesh: Mesh,
    pub neighbors: NeighborMap,
}
