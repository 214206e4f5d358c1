//! Delaunay triangulation of beacon positions (Bowyer–Watson).
//!
//! Purpose
//! - Provide a neighbor map that bounds the pattern search on large networks.
//!   The map is an approximation aid: shapes are always confirmed against the
//!   real connection graph, so an imperfect mesh only costs recall.
//!
//! Model
//! - Rebuilt from scratch on every call; nothing is updated incrementally.
//! - Input is capped at `TriangulationCfg::max_points` by input order and exact
//!   duplicate positions are dropped (first wins), which keeps the
//!   position → node id lookup unambiguous.
//! - Near-collinear triangles get a centroid-based circumcircle instead of an
//!   infinite one, so degenerate inputs degrade to sparse meshes, never panics.
//!
//! Code cross-refs: `geom::circumcircle`, `finder` (consumer of `NeighborMap`).

mod bowyer_watson;
mod types;

pub use bowyer_watson::triangulate;
pub use types::{Mesh, MeshEdge, NeighborMap, Triangle, Triangulation, TriangulationCfg};

#[cfg(test)]
mod tests;
