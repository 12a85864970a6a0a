//! Core data types for pairwise scoring.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Item`]: The payload compared on either side of a pair (a record or a map entry)
//! - [`Pair`]: A base/candidate comparison with a stable identity and a mutable score
//! - [`generate`]: Cross product of bases and candidates into pairs
//! - [`PipelineError`]: Configuration and type-contract failures
//!
//! ## Scores
//!
//! Scores are signed integer differences. Lower means more similar, so ranking
//! always sorts ascending:
//!
//! | Score | Meaning |
//! |-------|---------|
//! | 0     | identical as far as the operator can tell |
//! | 1     | a value differs under a matching key (default value penalty) |
//! | 100   | a key has no counterpart (default key penalty) |

pub mod error;
pub mod generator;
pub mod item;
pub mod pair;

pub use error::{Branch, PipelineError, Result};
pub use generator::{generate, generate_single, items};
pub use item::{Item, Shape};
pub use pair::{Pair, PairId, Score};
