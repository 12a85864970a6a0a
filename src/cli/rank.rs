//! Rank command - score every base against every candidate and list the
//! closest pairs.
//!
//! Both inputs are JSON arrays of records. Without `--pipeline`, each pair is
//! scored by a key+value map comparison.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::{item_value, read_json, OutputFormat};
use crate::core::generator::{generate, items};
use crate::core::pair::{self, Pair};
use crate::matching::operator::{EntryMatch, Penalties};
use crate::task::config::{OperatorConfig, TaskConfig};
use crate::utils::validation::{check_pair_limit, check_record_limit, ValidationError};

/// Arguments for the rank command
#[derive(Args)]
pub struct RankArgs {
    /// JSON array of base records
    #[arg(required = true)]
    pub bases: PathBuf,

    /// JSON array of candidate records
    #[arg(required = true)]
    pub candidates: PathBuf,

    /// Pipeline description (JSON). Defaults to a key+value map comparison
    #[arg(short, long)]
    pub pipeline: Option<PathBuf>,

    /// Number of top-ranked pairs to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

/// Execute the rank command
///
/// # Errors
///
/// Returns an error if inputs cannot be read, exceed the size limits, or the
/// pipeline fails.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: RankArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let bases = load_records(&args.bases, "base")?;
    let candidates = load_records(&args.candidates, "candidate")?;
    let total = check_pair_limit(bases.len(), candidates.len())?;

    if verbose {
        eprintln!(
            "Bases: {} records, candidates: {} records, {total} pairs",
            bases.len(),
            candidates.len(),
        );
    }

    let config = match &args.pipeline {
        Some(path) => load_pipeline(path)?,
        None => default_pipeline(),
    };
    let (mut pipeline, root) = config.build().context("Failed to build pipeline")?;

    if verbose {
        eprintln!("Pipeline: {} tasks", pipeline.len());
    }

    let pairs = generate(&items(bases), &items(candidates));
    let mut ranked = pipeline.run_task(root, pairs).context("Pipeline failed")?;
    pair::rank(&mut ranked);

    let kept = ranked.len();
    ranked.truncate(args.limit);

    match format {
        OutputFormat::Text => print_text(&ranked, kept, total),
        OutputFormat::Json => print_json(&ranked, kept, total)?,
        OutputFormat::Tsv => print_tsv(&ranked),
    }

    Ok(())
}

/// Key+value map comparison with default penalties
fn default_pipeline() -> TaskConfig {
    TaskConfig::Operator {
        operator: OperatorConfig::Map {
            mode: EntryMatch::KeyValue,
            penalties: Penalties::default(),
            entry_task: None,
        },
    }
}

fn load_records(path: &Path, side: &'static str) -> anyhow::Result<Vec<Value>> {
    let records = match read_json(path)? {
        Value::Array(records) => records,
        _ => return Err(ValidationError::NotAnArray(path.display().to_string()).into()),
    };

    check_record_limit(side, records.len())?;
    Ok(records)
}

fn load_pipeline(path: &Path) -> anyhow::Result<TaskConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline {}", path.display()))?;
    TaskConfig::from_json(&text).with_context(|| format!("Invalid pipeline in {}", path.display()))
}

fn print_text(ranked: &[Pair], kept: usize, total: usize) {
    println!("Ranked pairs: showing {} of {kept} ({total} generated)", ranked.len());

    for (i, pair) in ranked.iter().enumerate() {
        println!("\n{:>4}. score {}", i + 1, pair.score());
        println!("      base:      {}", item_value(pair.base()));
        println!("      candidate: {}", item_value(pair.candidate()));
    }
}

fn print_json(ranked: &[Pair], kept: usize, total: usize) -> anyhow::Result<()> {
    let pairs: Vec<Value> = ranked
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            serde_json::json!({
                "rank": i + 1,
                "score": pair.score(),
                "id": pair.id(),
                "base": item_value(pair.base()),
                "candidate": item_value(pair.candidate()),
            })
        })
        .collect();

    let output = serde_json::json!({
        "generated": total,
        "kept": kept,
        "pairs": pairs,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(ranked: &[Pair]) {
    println!("rank\tscore\tbase\tcandidate");
    for (i, pair) in ranked.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}",
            i + 1,
            pair.score(),
            item_value(pair.base()),
            item_value(pair.candidate()),
        );
    }
}
