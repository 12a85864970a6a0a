//! Nearest-match comparison of two map records.
//!
//! For every base entry, the entry is paired with each candidate entry and the
//! resulting 1 x |candidate| set is run through an entry-level task. The
//! cheapest result is the cost of that base entry; the pair's difference is the
//! sum of those minima:
//!
//! ```text
//! difference = SUM(e in base: min(entry_task({e} x candidate_entries)))
//! ```
//!
//! The assignment is greedy per base key. Two base entries may both pick the
//! same candidate entry, which keeps the cost at O(|base| * |candidate|).

use std::sync::Arc;

use tracing::trace;

use crate::core::error::{PipelineError, Result};
use crate::core::generator::generate_single;
use crate::core::item::{Item, Shape};
use crate::core::pair::{Pair, Score};
use crate::matching::operator::{EntryMatch, MapEntryOperator, Operator, Penalties};
use crate::task::pipeline::{Pipeline, TaskId};

/// Task tree run over each base entry's candidate set
struct EntryTask {
    pipeline: Pipeline,
    root: TaskId,
}

impl EntryTask {
    fn default_for(mode: EntryMatch, penalties: Penalties) -> Self {
        let mut pipeline = Pipeline::new();
        let root =
            pipeline.add_operator(MapEntryOperator::new(mode).with_penalties(penalties));
        Self { pipeline, root }
    }
}

/// Compares two map records by summing the best per-entry match cost
pub struct MapOperator {
    entry_task: EntryTask,
    penalties: Penalties,
}

impl MapOperator {
    /// Map operator whose entry task is a single [`MapEntryOperator`]
    pub fn new(mode: EntryMatch) -> Self {
        Self::with_penalties(mode, Penalties::default())
    }

    pub fn with_penalties(mode: EntryMatch, penalties: Penalties) -> Self {
        Self {
            entry_task: EntryTask::default_for(mode, penalties),
            penalties,
        }
    }

    /// Map operator running an arbitrary task tree over each entry set
    ///
    /// `root` must be a task of `pipeline`. The key penalty still prices base
    /// entries when the candidate map is empty.
    pub fn with_entry_task(pipeline: Pipeline, root: TaskId, penalties: Penalties) -> Self {
        Self {
            entry_task: EntryTask { pipeline, root },
            penalties,
        }
    }

    /// Replace the entry-level task
    pub fn set_entry_task(&mut self, pipeline: Pipeline, root: TaskId) {
        self.entry_task = EntryTask { pipeline, root };
    }

    /// Go back to a plain [`MapEntryOperator`] entry task
    pub fn reset_entry_task(&mut self, mode: EntryMatch) {
        self.entry_task = EntryTask::default_for(mode, self.penalties);
    }

    #[must_use]
    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    /// Difference between two map records
    ///
    /// Both items are split into entry items; the sum saturates at
    /// [`Score::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ShapeMismatch`] when either item is not a map
    /// record, and propagates any error raised by the entry task.
    pub fn map_difference(&mut self, base: &Item, candidate: &Item) -> Result<Score> {
        let base_entries = expect_entries(base)?;
        let candidate_entries = expect_entries(candidate)?;

        if base_entries.is_empty() {
            return Ok(0);
        }

        if candidate_entries.is_empty() {
            return Ok(count_to_score(base_entries.len()).saturating_mul(self.penalties.key));
        }

        let candidate_entries: Vec<Arc<Item>> =
            candidate_entries.into_iter().map(Arc::new).collect();

        let mut total: Score = 0;

        for entry in base_entries {
            let entry = Arc::new(entry);
            let data = generate_single(&entry, &candidate_entries);

            let results = self
                .entry_task
                .pipeline
                .run_task(self.entry_task.root, data)?;

            // an entry task that filters everything away contributes nothing
            if let Some(best) = results.iter().map(Pair::score).min() {
                trace!(?entry, best, "nearest entry match");
                total = total.saturating_add(best);
            }
        }

        Ok(total)
    }
}

impl Operator for MapOperator {
    fn difference(&mut self, pair: &Pair) -> Result<Score> {
        self.map_difference(pair.base(), pair.candidate())
    }
}

impl std::fmt::Debug for MapOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapOperator")
            .field("penalties", &self.penalties)
            .field("entry_tasks", &self.entry_task.pipeline.len())
            .finish()
    }
}

fn expect_entries(item: &Item) -> Result<Vec<Item>> {
    item.entries().ok_or(PipelineError::ShapeMismatch {
        operator: "MapOperator",
        expected: Shape::Map,
        found: item.shape(),
    })
}

#[inline]
fn count_to_score(count: usize) -> Score {
    Score::try_from(count).unwrap_or(Score::MAX)
}
