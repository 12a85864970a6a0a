//! # pairwise-rank
//!
//! A library for ranking candidate records by how much they differ from a set
//! of base records.
//!
//! Every base is paired with every candidate. Each pair carries a mutable
//! integer score, and a tree of tasks rewrites those scores, normalizes them
//! and narrows the collection down. Lower scores mean more similar records, so
//! the best matches sort first.
//!
//! ## Features
//!
//! - **Map comparison**: Greedy nearest-match over the entries of two records
//! - **Pluggable entry step**: The per-entry comparison is itself a task tree
//! - **Equalizers**: Binary, linear and exponential score normalization
//! - **Filters**: Count, percent, threshold and inverted selections
//! - **Composition**: Serial, branching and aggregating task nodes
//! - **Declarative pipelines**: Describe a whole task tree as JSON
//!
//! ## Example
//!
//! ```rust
//! use pairwise_rank::core::{generate, items};
//! use pairwise_rank::matching::{EntryMatch, PercentFilter};
//! use pairwise_rank::task::Pipeline;
//! use serde_json::json;
//!
//! let bases = items([json!({"key": "value"})]);
//! let candidates = items([
//!     json!({}),
//!     json!({"key": "value"}),
//!     json!({"key": "valueDifferent", "key2": "value2"}),
//! ]);
//!
//! let mut pipeline = Pipeline::new();
//! let query = pipeline.add_serial();
//! let compare = pipeline.add_map_operator(EntryMatch::Key);
//! let top = pipeline.add_processor(PercentFilter::new(0.33));
//! pipeline.add_child(query, compare).unwrap();
//! pipeline.add_child(query, top).unwrap();
//!
//! let best = pipeline.run_task(query, generate(&bases, &candidates)).unwrap();
//! assert_eq!(best.len(), 1);
//! assert_eq!(best[0].score(), 0);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Items, scored pairs, pair generation and errors
//! - [`matching`]: Operators, equalizers, filters and their batch adapters
//! - [`task`]: Task trees and declarative pipeline descriptions
//! - [`utils`]: Input size limits
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod matching;
pub mod task;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::error::{PipelineError, Result};
pub use crate::core::item::Item;
pub use crate::core::pair::{Pair, PairId, Score};
pub use crate::task::config::TaskConfig;
pub use crate::task::pipeline::{Pipeline, TaskId};
