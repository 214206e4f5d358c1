//! Node snapshot import and export.
//!
//! - JSON: an array of `constellation::model::Node`.
//! - CSV (via polars): nodes with columns `id,x,y[,level][,kind]`, links in a
//!   separate file with columns `a,b`. Links are applied symmetrically.

use anyhow::{bail, Context, Result};
use constellation::model::{link, Node, NodeId, NodeKind};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading {}", path.display()))
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    col.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.with_context(|| format!("`{name}` is empty in row {row}")))
        .collect()
}

fn u64_column(df: &DataFrame, name: &str) -> Result<Vec<u64>> {
    let col = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::UInt64)?;
    col.u64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.with_context(|| format!("`{name}` is not an id in row {row}")))
        .collect()
}

/// Optional columns fall back to the per-row default when absent or null.
fn levels(df: &DataFrame) -> Result<Vec<u32>> {
    let Ok(col) = df.column("level") else {
        return Ok(vec![1; df.height()]);
    };
    let col = col.cast(&DataType::UInt32)?;
    Ok(col.u32()?.into_iter().map(|v| v.unwrap_or(1)).collect())
}

fn kinds(df: &DataFrame) -> Result<Vec<NodeKind>> {
    let Ok(col) = df.column("kind") else {
        return Ok(vec![NodeKind::Standard; df.height()]);
    };
    let col = col.cast(&DataType::String)?;
    col.str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Ok(NodeKind::Standard),
            Some(s) => s
                .parse::<NodeKind>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("row {row}")),
        })
        .collect()
}

fn nodes_from_csv(path: &Path) -> Result<Vec<Node>> {
    let df = read_csv(path)?;
    let ids = u64_column(&df, "id")?;
    let xs = f64_column(&df, "x")?;
    let ys = f64_column(&df, "y")?;
    let levels = levels(&df)?;
    let kinds = kinds(&df)?;
    Ok(ids
        .into_iter()
        .zip(xs)
        .zip(ys)
        .zip(levels)
        .zip(kinds)
        .map(|((((id, x), y), level), kind)| {
            Node::new(id, x, y).with_level(level).with_kind(kind)
        })
        .collect())
}

/// `(a, b)` pairs from an edge CSV.
pub fn read_edges(path: &Path) -> Result<Vec<(NodeId, NodeId)>> {
    let df = read_csv(path)?;
    let a = u64_column(&df, "a")?;
    let b = u64_column(&df, "b")?;
    Ok(a.into_iter()
        .zip(b)
        .map(|(a, b)| (NodeId(a), NodeId(b)))
        .collect())
}

/// Load a node snapshot, applying extra links from `edges` when given.
pub fn load(input: &Path, edges: Option<&Path>) -> Result<Vec<Node>> {
    let mut nodes = if is_csv(input) {
        nodes_from_csv(input)?
    } else {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing nodes from {}", input.display()))?
    };
    if let Some(path) = edges {
        let pairs = read_edges(path)?;
        tracing::info!(edges = pairs.len(), path = %path.display(), "applying edge list");
        for (a, b) in pairs {
            link(&mut nodes, a, b);
        }
    }
    Ok(nodes)
}

/// Edge file written next to a CSV node file: `<stem>.edges.csv`.
pub fn edges_path(nodes_path: &Path) -> PathBuf {
    let stem = nodes_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "nodes".to_string());
    nodes_path.with_file_name(format!("{stem}.edges.csv"))
}

/// Write nodes as JSON, or as CSV plus an edge CSV. Returns every file written.
pub fn save(nodes: &[Node], out: &Path) -> Result<Vec<PathBuf>> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if !is_csv(out) {
        fs::write(out, serde_json::to_vec_pretty(nodes)?)
            .with_context(|| format!("writing {}", out.display()))?;
        return Ok(vec![out.to_path_buf()]);
    }
    let mut node_df = df!(
        "id" => nodes.iter().map(|n| n.id.0).collect::<Vec<u64>>(),
        "x" => nodes.iter().map(|n| n.position.x).collect::<Vec<f64>>(),
        "y" => nodes.iter().map(|n| n.position.y).collect::<Vec<f64>>(),
        "level" => nodes.iter().map(|n| n.level).collect::<Vec<u32>>(),
        "kind" => nodes.iter().map(|n| n.kind.as_str()).collect::<Vec<&str>>(),
    )?;
    let (a, b): (Vec<u64>, Vec<u64>) = nodes
        .iter()
        .flat_map(|n| n.connections.iter().map(move |c| (n.id.0, c.0)))
        .filter(|(a, b)| a < b)
        .unzip();
    let mut edge_df = df!("a" => a, "b" => b)?;
    let edges = edges_path(out);
    CsvWriter::new(File::create(out)?).finish(&mut node_df)?;
    CsvWriter::new(File::create(&edges)?).finish(&mut edge_df)?;
    Ok(vec![out.to_path_buf(), edges])
}

/// Fail early on inputs no pattern search can use.
pub fn ensure_usable(nodes: &[Node]) -> Result<()> {
    if let Some(n) = nodes
        .iter()
        .find(|n| !n.position.x.is_finite() || !n.position.y.is_finite())
    {
        bail!("node {} has a non-finite position", n.id);
    }
    Ok(())
}
