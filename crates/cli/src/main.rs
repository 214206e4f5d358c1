use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use constellation::bonus::StackingStrategy;
use constellation::model::network_issues;
use constellation::prelude::*;
use constellation::sample::{random_network, NetworkCfg, ReplayToken};
use constellation::suggest::SuggestionReport;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod network;
mod provenance;

use provenance::Payload;

#[derive(Parser)]
#[command(name = "constellation-cli")]
#[command(about = "Analyze beacon networks for regular-polygon patterns")]
struct Cmd {
    /// Optional run label; propagated to outputs and logs
    #[arg(long)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Find shapes, compute the bonus and suggest placements for one network
    Analyze {
        /// Nodes as JSON (`[Node]`) or CSV (`id,x,y[,level][,kind]`)
        #[arg(long)]
        input: PathBuf,
        /// Extra links as CSV (`a,b`)
        #[arg(long)]
        edges: Option<PathBuf>,
        /// Engine settings as JSON; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured stacking strategy
        #[arg(long)]
        strategy: Option<StackingStrategy>,
        /// Keep suggested positions this far from existing nodes
        #[arg(long)]
        min_spacing: Option<f64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a seeded random network
    Generate {
        #[arg(long, default_value_t = 40)]
        nodes: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Side of the square placement area
        #[arg(long, default_value_t = 1000.0)]
        extent: f64,
        /// Output path; `.csv` also writes `<stem>.edges.csv`
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Analyze {
            input,
            edges,
            config,
            strategy,
            min_spacing,
            out,
        } => {
            let opts = AnalyzeOpts {
                input,
                edges,
                config,
                strategy,
                min_spacing,
            };
            analyze(&opts, &out, cmd.tag)
        }
        Action::Generate {
            nodes,
            seed,
            extent,
            out,
        } => generate(nodes, seed, extent, &out, cmd.tag),
        Action::Report => report(cmd.tag),
    }
}

struct AnalyzeOpts {
    input: PathBuf,
    edges: Option<PathBuf>,
    config: Option<PathBuf>,
    strategy: Option<StackingStrategy>,
    min_spacing: Option<f64>,
}

#[derive(Serialize)]
struct Analysis {
    nodes: usize,
    network_issues: Vec<String>,
    evaluation: Evaluation,
    validation: constellation::bonus::BonusValidation,
    suggestions: SuggestionReport,
}

fn load_config(path: Option<&Path>) -> Result<EngineCfg> {
    let Some(path) = path else {
        return Ok(EngineCfg::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing config {}", path.display()))
}

fn analyze(opts: &AnalyzeOpts, out: &Path, tag: Option<String>) -> Result<()> {
    tracing::info!(input = %opts.input.display(), out = %out.display(), tag = ?tag, "analyze");
    let mut cfg = load_config(opts.config.as_deref())?;
    if let Some(strategy) = opts.strategy {
        cfg.bonus.strategy = strategy;
    }
    let nodes = network::load(&opts.input, opts.edges.as_deref())?;
    network::ensure_usable(&nodes)?;
    let issues: Vec<String> = network_issues(&nodes).iter().map(|i| i.to_string()).collect();
    for issue in &issues {
        tracing::warn!(%issue, "network issue");
    }

    let engine = PatternEngine::new(cfg.clone());
    let evaluation = engine.evaluate(&nodes);
    let validation = evaluation.bonus.validate();
    if !validation.is_ok() {
        tracing::warn!(errors = validation.errors.len(), "bonus failed validation");
    }
    let suggestions = match opts.min_spacing {
        Some(d) => engine.analyze(&nodes, &evaluation.shapes, &MinSpacing::new(&nodes, d)),
        None => engine.analyze(&nodes, &evaluation.shapes, &AllowAll),
    };
    tracing::info!(
        nodes = nodes.len(),
        tier = ?evaluation.tier,
        shapes = evaluation.shapes.len(),
        multiplier = evaluation.bonus.multiplier,
        suggestions = suggestions.suggestions.len(),
        "analysis done"
    );

    let analysis = Analysis {
        nodes: nodes.len(),
        network_issues: issues,
        evaluation,
        validation,
        suggestions,
    };
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(&analysis)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let payload = Payload::new(
        "analyze",
        json!({
            "input": opts.input,
            "edges": opts.edges,
            "config": cfg,
            "min_spacing": opts.min_spacing,
        }),
    )
    .tagged(tag);
    provenance::write_sidecar(out, &payload)?;
    Ok(())
}

fn generate(count: usize, seed: u64, extent: f64, out: &Path, tag: Option<String>) -> Result<()> {
    tracing::info!(count, seed, extent, out = %out.display(), "generate");
    let cfg = NetworkCfg {
        node_count: count,
        extent,
        ..NetworkCfg::default()
    };
    let nodes = random_network(cfg, ReplayToken::new(seed));
    let written = network::save(&nodes, out)?;
    let payload = Payload::new("generate", json!({ "network": cfg, "seed": seed })).tagged(tag);
    provenance::write_sidecar(out, &payload)?;
    tracing::info!(files = written.len(), "network written");
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let payload = Payload::new("report", json!({})).tagged(tag);
    let doc = provenance::document(&payload, &[]);
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generate_then_analyze() {
        let dir = tempdir().unwrap();
        let net = dir.path().join("net.csv");
        generate(30, 4, 800.0, &net, Some("t1".into())).unwrap();
        assert!(dir.path().join("net.edges.csv").exists());
        assert!(dir.path().join("net.provenance.json").exists());

        let out = dir.path().join("out").join("analysis.json");
        let opts = AnalyzeOpts {
            input: net.clone(),
            edges: Some(network::edges_path(&net)),
            config: None,
            strategy: Some(StackingStrategy::Additive),
            min_spacing: Some(10.0),
        };
        analyze(&opts, &out, None).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed["nodes"], 30);
        assert_eq!(parsed["evaluation"]["bonus"]["strategy"], "additive");
        assert!(parsed["evaluation"]["bonus"]["multiplier"].as_f64().unwrap() >= 1.0);
        let prov: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.path().join("out").join("analysis.provenance.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(prov["command"], "analyze");
        assert_eq!(prov["params"]["config"]["bonus"]["strategy"], "additive");
    }

    #[test]
    fn partial_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"bonus": {"max_multiplier_cap": 3.0}}"#).unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.bonus.max_multiplier_cap, 3.0);
        assert_eq!(cfg.finder.small_network_limit, 50);
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
