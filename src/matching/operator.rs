use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{PipelineError, Result};
use crate::core::item::{Item, Shape};
use crate::core::pair::{Pair, Score};

/// Default cost of a base key with no counterpart in the candidate
pub const DEFAULT_KEY_PENALTY: Score = 100;

/// Default cost of a matching key whose value differs
pub const DEFAULT_VALUE_PENALTY: Score = 1;

/// Computes the raw difference for a single pair
///
/// Implementations must be a pure function of the pair's base and candidate
/// (aside from writing the score) and must fail with
/// [`PipelineError::ShapeMismatch`] when given items of the wrong shape.
///
/// Closures of the form `FnMut(&Pair) -> Result<Score>` are operators too.
pub trait Operator {
    /// Difference between the pair's base and candidate
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ShapeMismatch` if base or candidate do not have
    /// the shape this operator works on.
    fn difference(&mut self, pair: &Pair) -> Result<Score>;

    /// Score the pair in place
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Operator::difference`].
    fn execute(&mut self, pair: &mut Pair) -> Result<()> {
        let difference = self.difference(pair)?;
        pair.set_score(difference);
        Ok(())
    }
}

impl<F> Operator for F
where
    F: FnMut(&Pair) -> Result<Score>,
{
    fn difference(&mut self, pair: &Pair) -> Result<Score> {
        self(pair)
    }
}

/// Sets every pair to the same difference, regardless of contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOperator {
    pub difference: Score,
}

impl FixedOperator {
    pub fn new(difference: Score) -> Self {
        Self { difference }
    }
}

impl Operator for FixedOperator {
    fn difference(&mut self, _pair: &Pair) -> Result<Score> {
        Ok(self.difference)
    }
}

/// Adds a constant to whatever score the pair already carries, saturating at
/// the `Score` bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetOperator {
    pub offset: Score,
}

impl OffsetOperator {
    pub fn new(offset: Score) -> Self {
        Self { offset }
    }
}

impl Operator for OffsetOperator {
    fn difference(&mut self, pair: &Pair) -> Result<Score> {
        Ok(pair.score().saturating_add(self.offset))
    }
}

/// Costs charged by the map comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties {
    /// Charged when keys differ (or a base key has no candidate entry at all)
    pub key: Score,
    /// Charged when keys match but values differ
    pub value: Score,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY_PENALTY,
            value: DEFAULT_VALUE_PENALTY,
        }
    }
}

impl Penalties {
    /// Check that a key mismatch always costs more than a value mismatch
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if either penalty is negative or
    /// the key penalty does not exceed the value penalty.
    pub fn validated(self) -> Result<Self> {
        if self.key < 0 || self.value < 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "penalties must be non-negative (key {}, value {})",
                self.key, self.value
            )));
        }
        if self.key <= self.value {
            return Err(PipelineError::InvalidConfig(format!(
                "key penalty {} must exceed value penalty {}",
                self.key, self.value
            )));
        }
        Ok(self)
    }
}

/// What two map entries must share to count as equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EntryMatch {
    /// Keys only; values are ignored
    Key,
    /// Keys and values
    #[default]
    KeyValue,
}

/// Compares two individual map entries
///
/// - 0 if the entries match under the configured [`EntryMatch`]
/// - the value penalty if keys match but values differ (key+value only)
/// - the key penalty if keys differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntryOperator {
    pub mode: EntryMatch,
    pub penalties: Penalties,
}

impl MapEntryOperator {
    pub fn new(mode: EntryMatch) -> Self {
        Self {
            mode,
            penalties: Penalties::default(),
        }
    }

    pub fn key() -> Self {
        Self::new(EntryMatch::Key)
    }

    pub fn key_value() -> Self {
        Self::new(EntryMatch::KeyValue)
    }

    #[must_use]
    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = penalties;
        self
    }

    /// Difference between two entries given as (key, value)
    #[must_use]
    pub fn entry_difference(&self, base: (&str, &Value), candidate: (&str, &Value)) -> Score {
        if base.0 != candidate.0 {
            return self.penalties.key;
        }

        match self.mode {
            EntryMatch::Key => 0,
            EntryMatch::KeyValue if base.1 == candidate.1 => 0,
            EntryMatch::KeyValue => self.penalties.value,
        }
    }
}

impl Operator for MapEntryOperator {
    fn difference(&mut self, pair: &Pair) -> Result<Score> {
        let base = expect_entry(pair.base())?;
        let candidate = expect_entry(pair.candidate())?;
        Ok(self.entry_difference(base, candidate))
    }
}

fn expect_entry(item: &Item) -> Result<(&str, &Value)> {
    item.as_entry().ok_or(PipelineError::ShapeMismatch {
        operator: "MapEntryOperator",
        expected: Shape::Entry,
        found: item.shape(),
    })
}
