use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::{read_json, OutputFormat};
use crate::core::item::Item;
use crate::core::pair::{Pair, Score};
use crate::matching::map_operator::MapOperator;
use crate::matching::operator::{EntryMatch, Operator};

#[derive(Args)]
pub struct CompareArgs {
    /// First record (JSON object)
    #[arg(required = true)]
    pub input_a: PathBuf,

    /// Second record (JSON object)
    #[arg(required = true)]
    pub input_b: PathBuf,

    /// What two entries must share to count as equal
    #[arg(long = "match", value_enum, default_value = "key-value")]
    pub mode: EntryMatch,

    /// Also compute the reverse comparison (B against A).
    /// Map differences are asymmetric: only the base's keys are priced.
    #[arg(long)]
    pub symmetric: bool,
}

/// Execute the compare command
///
/// # Errors
///
/// Returns an error if either input cannot be read or is not a JSON object.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let a = read_json(&args.input_a)?;
    let b = read_json(&args.input_b)?;

    if verbose {
        eprintln!("Input A: {} keys", key_count(&a));
        eprintln!("Input B: {} keys", key_count(&b));
    }

    let mut operator = MapOperator::new(args.mode);

    let forward = score(&mut operator, &a, &b)
        .with_context(|| format!("Cannot compare {}", args.input_a.display()))?;
    let reverse = if args.symmetric {
        Some(
            score(&mut operator, &b, &a)
                .with_context(|| format!("Cannot compare {}", args.input_b.display()))?,
        )
    } else {
        None
    };

    match format {
        OutputFormat::Text => {
            println!(
                "\nComparing {} vs {} ({})",
                args.input_a.display(),
                args.input_b.display(),
                mode_name(args.mode)
            );
            println!("\n   Difference: {forward}");
            if let Some(reverse) = reverse {
                println!("   Reverse difference: {reverse}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "a": args.input_a.display().to_string(),
                "b": args.input_b.display().to_string(),
                "match": args.mode,
                "forward": forward,
                "reverse": reverse,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("direction\tbase\tcandidate\tmatch\tdifference");
            println!(
                "forward\t{}\t{}\t{}\t{forward}",
                args.input_a.display(),
                args.input_b.display(),
                mode_name(args.mode)
            );
            if let Some(reverse) = reverse {
                println!(
                    "reverse\t{}\t{}\t{}\t{reverse}",
                    args.input_b.display(),
                    args.input_a.display(),
                    mode_name(args.mode)
                );
            }
        }
    }

    Ok(())
}

fn score(operator: &mut MapOperator, base: &Value, candidate: &Value) -> anyhow::Result<Score> {
    let mut pair = Pair::new(
        Arc::new(Item::record(base.clone())),
        Arc::new(Item::record(candidate.clone())),
    );
    operator.execute(&mut pair)?;
    Ok(pair.score())
}

fn key_count(value: &Value) -> usize {
    value.as_object().map_or(0, serde_json::Map::len)
}

fn mode_name(mode: EntryMatch) -> &'static str {
    match mode {
        EntryMatch::Key => "key",
        EntryMatch::KeyValue => "key-value",
    }
}
