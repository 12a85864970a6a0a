//! Scoring building blocks: operators, equalizers and filters.
//!
//! - [`Operator`]: computes the raw difference of a single pair
//! - [`MapOperator`]: nearest-match comparison of two map records
//! - [`Equalizer`]: rescales the scores of a whole batch
//! - [`Processor`]: transforms a collection of pairs (filters and batch adapters)
//!
//! ## Composition
//!
//! Operators and equalizers work below the collection level. The batch
//! adapters lift them to [`Processor`]s so every step of a task tree has the
//! same shape:
//!
//! | Step | Lifted by | Effect on the collection |
//! |------|-----------|--------------------------|
//! | [`Operator`] | [`BatchOperator`] | rescores every pair, size and order kept |
//! | [`Equalizer`] | [`BatchEqualizer`] | setup over all scores, then rescales each |
//! | filter | itself | returns a subset of the input |
//!
//! ## Example
//!
//! ```rust
//! use pairwise_rank::core::{generate, items};
//! use pairwise_rank::matching::{BatchOperator, CountFilter, EntryMatch, MapOperator, Processor};
//! use serde_json::json;
//!
//! let bases = items([json!({"name": "ada"})]);
//! let candidates = items([json!({"name": "ada"}), json!({"name": "alan"})]);
//!
//! let pairs = BatchOperator::new(MapOperator::new(EntryMatch::KeyValue))
//!     .execute(generate(&bases, &candidates))
//!     .unwrap();
//! let best = CountFilter::new(1).execute(pairs).unwrap();
//!
//! assert_eq!(best[0].score(), 0);
//! ```

pub mod batch;
pub mod equalizer;
pub mod filter;
pub mod map_operator;
pub mod operator;

pub use batch::{BatchEqualizer, BatchOperator};
pub use equalizer::{BinaryEqualizer, Equalizer, ExponentialEqualizer, LinearEqualizer};
pub use filter::{
    BlockadeFilter, CountFilter, IdentityFilter, Inverter, PercentFilter, Processor,
    ThresholdFilter,
};
pub use map_operator::MapOperator;
pub use operator::{
    EntryMatch, FixedOperator, MapEntryOperator, OffsetOperator, Operator, Penalties,
    DEFAULT_KEY_PENALTY, DEFAULT_VALUE_PENALTY,
};
