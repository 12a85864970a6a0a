//! Command-line interface for pairwise-rank.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **rank**: Score every base record against every candidate and list the closest pairs
//! - **compare**: Score a single record against another
//!
//! ## Usage
//!
//! ```text
//! # Rank candidates against bases with the default map comparison
//! pairwise-rank rank bases.json candidates.json --limit 5
//!
//! # Use a pipeline described as JSON
//! pairwise-rank rank bases.json candidates.json --pipeline pipeline.json
//!
//! # Compare two records in both directions, keys only
//! pairwise-rank compare a.json b.json --match key --symmetric
//!
//! # JSON output for scripting
//! pairwise-rank --format json rank bases.json candidates.json
//! ```

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::core::item::Item;

pub mod compare;
pub mod rank;

#[derive(Parser)]
#[command(name = "pairwise-rank")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Rank candidate records by their difference to base records")]
#[command(
    long_about = "pairwise-rank pairs every base record with every candidate record, scores each pair with a configurable pipeline of operators, equalizers and filters, and lists the pairs in ascending order of difference.\n\nLower scores mean more similar records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank every candidate against every base record
    Rank(rank::RankArgs),

    /// Compare two records
    Compare(compare::CompareArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Read and parse a JSON document
fn read_json(path: &Path) -> anyhow::Result<Value> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Plain JSON view of an item: a record as-is, an entry as a one-key object
fn item_value(item: &Item) -> Value {
    match item {
        Item::Record(value) => value.clone(),
        Item::Entry { key, value } => {
            let mut map = serde_json::Map::new();
            map.insert(key.clone(), value.clone());
            Value::Object(map)
        }
    }
}
