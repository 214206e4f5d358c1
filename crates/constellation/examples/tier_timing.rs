//! Timing probe for the three search tiers and the suggestion pass.
//!
//! Usage:
//!   cargo run -p constellation --release --example tier_timing -- tiers
//!   cargo run -p constellation --release --example tier_timing -- suggest
//!
//! Prints one line per network size with the tier taken, shape counts per
//! kind, the multiplier and wall time. Networks are seeded, so repeated runs
//! compare like with like.

use std::time::Instant;

use constellation::model::ShapeKind;
use constellation::prelude::*;
use constellation::sample::{random_network, NetworkCfg, ReplayToken};

fn main() {
    let mode = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tiers".to_string());
    match mode.as_str() {
        "tiers" => show_tiers(),
        "suggest" => show_suggest(),
        _ => {
            eprintln!("usage: tier_timing [tiers|suggest]");
        }
    }
}

fn network(n: usize, seed: u64) -> Vec<Node> {
    let cfg = NetworkCfg {
        node_count: n,
        extent: 150.0 * (n as f64).sqrt(),
        ..NetworkCfg::default()
    };
    random_network(cfg, ReplayToken::new(seed))
}

fn show_tiers() {
    let engine = PatternEngine::default();
    for &n in &[20usize, 49, 50, 120, 199, 200, 400] {
        let nodes = network(n, 2025);
        let start = Instant::now();
        let eval = engine.evaluate(&nodes);
        let elapsed = start.elapsed();
        let counts: Vec<usize> = ShapeKind::ALL
            .iter()
            .map(|k| eval.shapes.iter().filter(|s| s.kind == *k).count())
            .collect();
        println!(
            "n={:>3} tier={:<12?} shapes(tri,sq,pent,hex)={:?} multiplier={:.3} time={:?}",
            n, eval.tier, counts, eval.bonus.multiplier, elapsed
        );
    }
}

fn show_suggest() {
    let engine = PatternEngine::default();
    for &n in &[10usize, 30, 60] {
        let nodes = network(n, 7);
        let shapes = engine.find_shapes(&nodes);
        let validator = MinSpacing::new(&nodes, 20.0);
        let start = Instant::now();
        let report = engine.analyze(&nodes, &shapes, &validator);
        let elapsed = start.elapsed();
        println!(
            "n={:>3} incomplete={} suggestions={} best={:?} potential={:.3} time={:?}",
            n,
            report.incomplete_patterns.len(),
            report.suggestions.len(),
            report.best_next_position.map(|p| (p.x.round(), p.y.round())),
            report.aggregate_potential_bonus,
            elapsed
        );
    }
}
