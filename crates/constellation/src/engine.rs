//! Cached facade over triangulation, pattern finding, bonus and suggestions.
//!
//! Purpose
//! - One entry point for hosts that query the same network every frame: each
//!   stage is memoized in an injected `EngineCaches` keyed by a fingerprint of
//!   its inputs and the stage's settings.
//!
//! Conventions
//! - Cache hits return the same value a miss would have computed.
//! - Caches may be shared between engines with different settings; the
//!   settings are part of every key.
//! - Suggestions are cached only for validators that report a `cache_tag`.
//!
//! Code cross-refs: `cache::ResultCache`, `finder`, `bonus`, `suggest`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bonus::{BonusCalculator, BonusConfig, BonusResult};
use crate::cache::{CacheCfg, CacheStats, Clock, KeyBuilder, ResultCache, SystemClock};
use crate::finder::{FinderCfg, PatternFinder, SearchTier};
use crate::model::{annotate_connections, derive_connections, Connection, Node, Shape};
use crate::suggest::{PlacementValidator, SuggestCfg, SuggestionEngine, SuggestionReport};
use crate::triangulation::{triangulate, Triangulation};

/// Settings of every stage, loadable from one JSON document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    pub finder: FinderCfg,
    pub bonus: BonusConfig,
    pub suggest: SuggestCfg,
    pub cache: CacheCfg,
}

/// One TTL cache per stage.
pub struct EngineCaches {
    pub neighbors: ResultCache<Triangulation>,
    pub shapes: ResultCache<Vec<Shape>>,
    pub bonus: ResultCache<BonusResult>,
    pub suggestions: ResultCache<SuggestionReport>,
}

impl EngineCaches {
    pub fn new(cfg: &CacheCfg) -> Self {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: &CacheCfg, clock: Arc<dyn Clock>) -> Self {
        let every = cfg.cleanup_interval;
        Self {
            neighbors: ResultCache::with_clock(cfg.neighbors_ttl, every, clock.clone()),
            shapes: ResultCache::with_clock(cfg.shapes_ttl, every, clock.clone()),
            bonus: ResultCache::with_clock(cfg.bonus_ttl, every, clock.clone()),
            suggestions: ResultCache::with_clock(cfg.suggestions_ttl, every, clock),
        }
    }

    /// Sweep every cache; returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.neighbors.purge_expired()
            + self.shapes.purge_expired()
            + self.bonus.purge_expired()
            + self.suggestions.purge_expired()
    }

    pub fn clear(&self) {
        self.neighbors.clear();
        self.shapes.clear();
        self.bonus.clear();
        self.suggestions.clear();
    }

    /// `(neighbors, shapes, bonus, suggestions)`.
    pub fn stats(&self) -> [CacheStats; 4] {
        [
            self.neighbors.stats(),
            self.shapes.stats(),
            self.bonus.stats(),
            self.suggestions.stats(),
        ]
    }
}

/// Shapes and bonus of one snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub tier: SearchTier,
    /// Derived connections, annotated with the shapes using them.
    pub connections: Vec<Connection>,
    pub shapes: Vec<Shape>,
    pub bonus: BonusResult,
}

pub struct PatternEngine {
    finder: PatternFinder,
    calculator: BonusCalculator,
    suggester: SuggestionEngine,
    caches: Arc<EngineCaches>,
}

impl PatternEngine {
    pub fn new(cfg: EngineCfg) -> Self {
        let caches = Arc::new(EngineCaches::new(&cfg.cache));
        Self::with_caches(cfg, caches)
    }

    pub fn with_caches(cfg: EngineCfg, caches: Arc<EngineCaches>) -> Self {
        info!(
            strategy = ?cfg.bonus.strategy,
            small = cfg.finder.small_network_limit,
            dense = cfg.finder.dense_network_limit,
            "pattern engine ready"
        );
        Self {
            finder: PatternFinder::new(cfg.finder),
            calculator: BonusCalculator::new(cfg.bonus),
            suggester: SuggestionEngine::new(cfg.suggest),
            caches,
        }
    }

    pub fn caches(&self) -> &Arc<EngineCaches> {
        &self.caches
    }

    pub fn finder_cfg(&self) -> &FinderCfg {
        &self.finder.cfg
    }

    pub fn bonus_cfg(&self) -> &BonusConfig {
        &self.calculator.cfg
    }

    /// Delaunay mesh and neighbor map of the node positions.
    pub fn triangulate(&self, nodes: &[Node]) -> Triangulation {
        let cfg = self.finder.cfg.triangulation;
        let key = KeyBuilder::new("triangulation").add(nodes).add(&cfg).finish();
        self.caches
            .neighbors
            .get_or_insert_with(key, || triangulate(nodes, cfg))
    }

    /// Confirmed shapes over the connections derived from `nodes`.
    pub fn find_shapes(&self, nodes: &[Node]) -> Vec<Shape> {
        let key = KeyBuilder::new("shapes")
            .add(nodes)
            .add(&self.finder.cfg)
            .finish();
        self.caches.shapes.get_or_insert_with(key, || {
            let connections = derive_connections(nodes);
            match self.finder.cfg.tier_for(nodes.len()) {
                SearchTier::Exhaustive => self.finder.find_shapes(nodes, &connections),
                SearchTier::Triangulated | SearchTier::Dense => {
                    let mesh = self.triangulate(nodes);
                    self.finder
                        .find_shapes_with(nodes, &connections, Some(&mesh.neighbors))
                }
            }
        })
    }

    pub fn calculate(&self, shapes: &[Shape], nodes: &[Node]) -> BonusResult {
        self.calculate_with(shapes, nodes, &self.calculator.cfg)
    }

    /// As `calculate` with a one-off config (e.g. a strategy preview).
    pub fn calculate_with(&self, shapes: &[Shape], nodes: &[Node], cfg: &BonusConfig) -> BonusResult {
        let key = KeyBuilder::new("bonus")
            .add(shapes)
            .add(nodes)
            .add(cfg)
            .finish();
        self.caches
            .bonus
            .get_or_insert_with(key, || crate::bonus::calculate(shapes, nodes, cfg))
    }

    pub fn analyze(
        &self,
        nodes: &[Node],
        existing: &[Shape],
        validator: &dyn PlacementValidator,
    ) -> SuggestionReport {
        let Some(tag) = validator.cache_tag() else {
            debug!("validator has no cache tag, suggestions uncached");
            return self.suggester.analyze(nodes, existing, validator);
        };
        let key = KeyBuilder::new("suggestions")
            .add(nodes)
            .add(existing)
            .add(&self.suggester.cfg)
            .add_hash(&tag)
            .finish();
        self.caches
            .suggestions
            .get_or_insert_with(key, || self.suggester.analyze(nodes, existing, validator))
    }

    /// Shapes, annotated connections and bonus in one call.
    pub fn evaluate(&self, nodes: &[Node]) -> Evaluation {
        let shapes = self.find_shapes(nodes);
        let bonus = self.calculate(&shapes, nodes);
        let mut connections = derive_connections(nodes);
        annotate_connections(&mut connections, &shapes);
        Evaluation {
            tier: self.finder.cfg.tier_for(nodes.len()),
            connections,
            shapes,
            bonus,
        }
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(EngineCfg::default())
    }
}
