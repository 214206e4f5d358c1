//! Beacon constellation pattern engine.
//!
//! Finds regular polygons (triangle, square, pentagon, hexagon) among connected
//! beacons, turns them into a production multiplier and suggests where the next
//! beacon should go.
//!
//! Layout
//! - `geom`, `model`: primitives and the shared data model.
//! - `triangulation` → `detect` → `finder` → `bonus`; `suggest` reuses the
//!   detector and the finder's subset enumeration.
//! - `cache` + `engine`: memoized facade for hosts that query every frame.
//! - `sample`: reproducible random networks for tests, benches and the CLI.

pub mod bonus;
pub mod cache;
pub mod detect;
pub mod engine;
pub mod finder;
pub mod geom;
pub mod model;
pub mod sample;
pub mod suggest;
pub mod triangulation;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use engine::{EngineCaches, EngineCfg, Evaluation, PatternEngine};
pub use geom::Vec2;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::bonus::{BonusCalculator, BonusConfig, BonusResult, StackingStrategy};
    pub use crate::detect::{ShapeDetector, Tolerance};
    pub use crate::engine::{EngineCfg, Evaluation, PatternEngine};
    pub use crate::finder::{FinderCfg, PatternFinder};
    pub use crate::geom::Vec2;
    pub use crate::model::{
        derive_connections, link, link_ring, Connection, Node, NodeId, NodeKind, Shape, ShapeKind,
    };
    pub use crate::suggest::{AllowAll, MinSpacing, PlacementValidator, SuggestionEngine};
}
