//! Criterion benchmarks for the pattern pipeline (finder tiers and bonus).
//! Sizes cover all three search tiers with default limits (50 / 200).

use constellation::bonus::{calculate, BonusConfig, StackingStrategy};
use constellation::finder::PatternFinder;
use constellation::model::derive_connections;
use constellation::sample::{random_network, NetworkCfg, ReplayToken};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn network(n: usize, seed: u64) -> Vec<constellation::model::Node> {
    let cfg = NetworkCfg {
        node_count: n,
        extent: 150.0 * (n as f64).sqrt(),
        ..NetworkCfg::default()
    };
    random_network(cfg, ReplayToken::new(seed))
}

fn bench_finder(c: &mut Criterion) {
    let mut group = c.benchmark_group("finder");
    let finder = PatternFinder::default();
    for &n in &[30usize, 120, 300] {
        let nodes = network(n, 7);
        let conns = derive_connections(&nodes);
        group.bench_with_input(BenchmarkId::new("find_shapes", n), &n, |b, _| {
            b.iter(|| finder.find_shapes(&nodes, &conns))
        });
    }
    group.finish();
}

fn bench_bonus(c: &mut Criterion) {
    let mut group = c.benchmark_group("bonus");
    let nodes = network(120, 11);
    let shapes = PatternFinder::default().find_shapes(&nodes, &derive_connections(&nodes));
    for strategy in StackingStrategy::ALL {
        let cfg = BonusConfig::default().with_strategy(strategy);
        group.bench_with_input(
            BenchmarkId::new("calculate", format!("{strategy:?}")),
            &cfg,
            |b, cfg| b.iter(|| calculate(&shapes, &nodes, cfg)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_finder, bench_bonus);
criterion_main!(benches);
