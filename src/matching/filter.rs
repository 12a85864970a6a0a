use tracing::warn;

use crate::core::error::Result;
use crate::core::pair::{self, Pair, Score};

/// Transforms a collection of pairs
///
/// This is the shape of every leaf step in a task tree: filters, and the batch
/// adapters that lift operators and equalizers to whole collections.
///
/// A processor used as a selection step must not rely on input order and must
/// return a subset (by identity) of its input; [`Inverter`] depends on it.
pub trait Processor {
    /// Process a collection and return the result
    ///
    /// # Errors
    ///
    /// Returns an error if a wrapped operator rejects a pair.
    fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>>;
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        (**self).execute(pairs)
    }
}

/// Helper to convert a collection size to f64 for percentage calculations
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Passes the input through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter;

impl Processor for IdentityFilter {
    fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        Ok(pairs)
    }
}

/// Returns an empty result whatever the input
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockadeFilter;

impl Processor for BlockadeFilter {
    fn execute(&mut self, _pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        Ok(Vec::new())
    }
}

/// Keeps the `count` best-ranked (lowest score) pairs
#[derive(Debug, Clone, Copy)]
pub struct CountFilter {
    pub count: usize,
}

impl CountFilter {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Processor for CountFilter {
    fn execute(&mut self, mut pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        pair::rank(&mut pairs);
        pairs.truncate(self.count);
        Ok(pairs)
    }
}

/// Keeps the best-ranked `ceil(len * percent)` pairs
///
/// `percent` is expected to lie in (0, 1). Other values are not rejected: the
/// kept count is clamped to the collection size.
#[derive(Debug, Clone, Copy)]
pub struct PercentFilter {
    pub percent: f64,
}

impl PercentFilter {
    pub fn new(percent: f64) -> Self {
        if !(percent > 0.0 && percent < 1.0) {
            warn!(percent, "percent filter expects a fraction in (0, 1)");
        }
        Self { percent }
    }

    /// Number of pairs kept out of `len`
    #[must_use]
    pub fn keep_count(&self, len: usize) -> usize {
        let wanted = (count_to_f64(len) * self.percent).ceil();
        if wanted.is_nan() || wanted <= 0.0 {
            return 0;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let wanted = wanted as usize;
        wanted.min(len)
    }
}

impl Processor for PercentFilter {
    fn execute(&mut self, mut pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        let keep = self.keep_count(pairs.len());
        pair::rank(&mut pairs);
        pairs.truncate(keep);
        Ok(pairs)
    }
}

/// Keeps pairs scoring at or below `threshold`, in input order
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFilter {
    pub threshold: Score,
}

impl ThresholdFilter {
    pub fn new(threshold: Score) -> Self {
        Self { threshold }
    }
}

impl Processor for ThresholdFilter {
    fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        Ok(pairs
            .into_iter()
            .filter(|p| p.score() <= self.threshold)
            .collect())
    }
}

/// Everything the wrapped filter would drop
///
/// Given `{a, b, c}` and a filter result `{a}`, the output is `{b, c}`.
/// Membership is decided by pair identity; the output keeps input order.
pub struct Inverter {
    filter: Box<dyn Processor>,
}

impl Inverter {
    pub fn new(filter: impl Processor + 'static) -> Self {
        Self {
            filter: Box::new(filter),
        }
    }

    pub fn from_boxed(filter: Box<dyn Processor>) -> Self {
        Self { filter }
    }
}

impl Processor for Inverter {
    fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        let selected = self.filter.execute(pair::copy_all(&pairs))?;
        Ok(pair::difference(pairs, &selected))
    }
}

impl std::fmt::Debug for Inverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inverter").finish_non_exhaustive()
    }
}
