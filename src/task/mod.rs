//! Task trees: composing processors into pipelines.
//!
//! A [`Pipeline`] owns every task node and hands out [`TaskId`] handles. Four
//! kinds of node exist:
//!
//! | Kind | Children | Behavior |
//! |------|----------|----------|
//! | processor | none | runs a filter, batch operator or batch equalizer |
//! | serial | ordered list | children run one after another over a shared buffer |
//! | branching | match + remainder | a filter splits the input, each side runs its own task, outputs are concatenated |
//! | aggregator | ordered list | each child runs on a copy of the input, scores are summed per pair identity |
//!
//! Attaching a task that is already an ancestor of its new parent is rejected,
//! so a pipeline is always a forest.
//!
//! Pipelines can also be described as JSON and built with [`TaskConfig`].
//!
//! ## Example
//!
//! ```rust
//! use pairwise_rank::core::{generate, items};
//! use pairwise_rank::matching::{CountFilter, EntryMatch, LinearEqualizer};
//! use pairwise_rank::task::Pipeline;
//! use serde_json::json;
//!
//! let mut pipeline = Pipeline::new();
//! let query = pipeline.add_serial();
//! let compare = pipeline.add_map_operator(EntryMatch::KeyValue);
//! let normalize = pipeline.add_equalizer(LinearEqualizer::new(100));
//! let best = pipeline.add_processor(CountFilter::new(1));
//! for step in [compare, normalize, best] {
//!     pipeline.add_child(query, step).unwrap();
//! }
//!
//! let bases = items([json!({"name": "ada", "born": 1815})]);
//! let candidates = items([json!({"name": "ada"}), json!({"name": "alan", "born": 1912})]);
//!
//! let ranked = pipeline.run_task(query, generate(&bases, &candidates)).unwrap();
//! assert_eq!(ranked.len(), 1);
//! ```

pub mod config;
pub mod pipeline;

pub use config::{EqualizerConfig, FilterConfig, OperatorConfig, TaskConfig};
pub use pipeline::{Pipeline, TaskId, TaskKind};
