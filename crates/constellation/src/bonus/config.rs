//! Bonus settings. Every balance constant lives here as a default.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::cache::Fingerprint;
use crate::model::NodeKind;

use super::overlap::OverlapKind;

/// How per-node multipliers are folded into one network multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingStrategy {
    /// Weighted geometric mean.
    #[default]
    Multiplicative,
    /// `1 + weighted mean of (m - 1)`.
    Additive,
    Maximum,
    /// Multipliers ≤ 2 combine geometrically, stronger ones additively.
    Weighted,
}

impl StackingStrategy {
    pub const ALL: [StackingStrategy; 4] = [
        StackingStrategy::Multiplicative,
        StackingStrategy::Additive,
        StackingStrategy::Maximum,
        StackingStrategy::Weighted,
    ];
}

impl std::str::FromStr for StackingStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiplicative" => Ok(Self::Multiplicative),
            "additive" => Ok(Self::Additive),
            "maximum" | "max" => Ok(Self::Maximum),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!("unknown stacking strategy `{other}`")),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Energy,
    Matter,
    Data,
    Influence,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Energy,
        ResourceKind::Matter,
        ResourceKind::Data,
        ResourceKind::Influence,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Energy => "energy",
            ResourceKind::Matter => "matter",
            ResourceKind::Data => "data",
            ResourceKind::Influence => "influence",
        })
    }
}

/// Base production rate and how strongly the multiplier applies to it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRate {
    pub base_rate: f64,
    pub weight: f64,
}

/// Modifier per overlap kind, blended toward 1.0 by severity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapModifiers {
    pub vertex: f64,
    pub edge: f64,
    pub partial: f64,
    pub nested: f64,
    pub identical: f64,
}

impl Default for OverlapModifiers {
    fn default() -> Self {
        Self {
            vertex: 1.1,
            edge: 0.85,
            partial: 0.75,
            nested: 0.6,
            identical: 0.5,
        }
    }
}

impl OverlapModifiers {
    pub fn get(&self, kind: OverlapKind) -> f64 {
        match kind {
            OverlapKind::None => 1.0,
            OverlapKind::Vertex => self.vertex,
            OverlapKind::Edge => self.edge,
            OverlapKind::Partial => self.partial,
            OverlapKind::Nested => self.nested,
            OverlapKind::Identical => self.identical,
        }
    }

    /// `1 + (modifier - 1) * severity`.
    #[inline]
    pub fn blended(&self, kind: OverlapKind, severity: f64) -> f64 {
        1.0 + (self.get(kind) - 1.0) * severity
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub standard: f64,
    pub harvester: f64,
    pub amplifier: f64,
    pub relay: f64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self {
            standard: 1.0,
            harvester: 1.05,
            amplifier: 1.2,
            relay: 0.95,
        }
    }
}

impl TypeWeights {
    pub fn get(&self, kind: NodeKind) -> f64 {
        match kind {
            NodeKind::Standard => self.standard,
            NodeKind::Harvester => self.harvester,
            NodeKind::Amplifier => self.amplifier,
            NodeKind::Relay => self.relay,
        }
    }
}

/// Bonus calculator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub strategy: StackingStrategy,
    /// `0` means uncapped.
    pub max_multiplier_cap: f64,
    pub diminishing_returns_threshold: f64,
    pub diminishing_returns_factor: f64,
    /// Overlaps with a severity at or below this are dropped.
    pub min_overlap_threshold: f64,
    /// Resources that benefit from the multiplier; the rest stay at base rate.
    pub target_resource_types: Vec<ResourceKind>,
    pub resources: BTreeMap<ResourceKind, ResourceRate>,
    pub overlap_modifiers: OverlapModifiers,
    pub type_weights: TypeWeights,
    /// Connection-quality weight for quality levels 1..=5.
    pub quality_table: [f64; 5],
}

impl Default for BonusConfig {
    fn default() -> Self {
        let resources = [
            (ResourceKind::Energy, 1.0, 1.0),
            (ResourceKind::Matter, 0.5, 0.8),
            (ResourceKind::Data, 0.25, 1.2),
            (ResourceKind::Influence, 0.1, 0.5),
        ]
        .into_iter()
        .map(|(k, base_rate, weight)| (k, ResourceRate { base_rate, weight }))
        .collect();
        Self {
            strategy: StackingStrategy::Multiplicative,
            max_multiplier_cap: 0.0,
            diminishing_returns_threshold: 10.0,
            diminishing_returns_factor: 0.8,
            min_overlap_threshold: 0.0,
            target_resource_types: ResourceKind::ALL.to_vec(),
            resources,
            overlap_modifiers: OverlapModifiers::default(),
            type_weights: TypeWeights::default(),
            quality_table: [1.0, 1.05, 1.1, 1.2, 1.3],
        }
    }
}

impl BonusConfig {
    pub fn with_strategy(mut self, strategy: StackingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Quality weight for `floor((level + connections) / 2)` clamped to `1..=5`.
    pub fn quality_weight(&self, level: u32, connections: usize) -> f64 {
        let q = ((level as usize + connections) / 2).clamp(1, 5);
        self.quality_table[q - 1]
    }
}

impl Fingerprint for BonusConfig {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.strategy.hash(h);
        for x in [
            self.max_multiplier_cap,
            self.diminishing_returns_threshold,
            self.diminishing_returns_factor,
            self.min_overlap_threshold,
        ] {
            x.fingerprint(h);
        }
        self.target_resource_types.hash(h);
        for (k, r) in &self.resources {
            k.hash(h);
            r.base_rate.fingerprint(h);
            r.weight.fingerprint(h);
        }
        let m = &self.overlap_modifiers;
        let t = &self.type_weights;
        for x in [m.vertex, m.edge, m.partial, m.nested, m.identical] {
            x.fingerprint(h);
        }
        for x in [t.standard, t.harvester, t.amplifier, t.relay] {
            x.fingerprint(h);
        }
        self.quality_table[..].fingerprint(h);
    }
}
