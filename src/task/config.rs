//! Declarative pipeline descriptions.
//!
//! A [`TaskConfig`] is a serde tree mirroring the task tree it builds. Every
//! node is internally tagged by `"type"`:
//!
//! ```json
//! {"type": "serial", "tasks": [
//!   {"type": "operator", "operator": {"type": "map", "match": "key_value"}},
//!   {"type": "equalizer", "equalizer": {"type": "linear", "range": 100}},
//!   {"type": "filter", "filter": {"type": "count", "count": 3}}
//! ]}
//! ```
//!
//! Building goes through the same attach operations as hand-wired pipelines,
//! so every structural rule of [`Pipeline`] still applies.

use serde::{Deserialize, Serialize};

use crate::core::error::{PipelineError, Result};
use crate::core::pair::Score;
use crate::matching::batch::{BatchEqualizer, BatchOperator};
use crate::matching::equalizer::{
    BinaryEqualizer, Equalizer, ExponentialEqualizer, LinearEqualizer,
};
use crate::matching::filter::{
    BlockadeFilter, CountFilter, IdentityFilter, Inverter, PercentFilter, Processor,
    ThresholdFilter,
};
use crate::matching::map_operator::MapOperator;
use crate::matching::operator::{
    EntryMatch, FixedOperator, MapEntryOperator, OffsetOperator, Operator, Penalties,
};
use crate::task::pipeline::{Pipeline, TaskId};

/// One node of a pipeline description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskConfig {
    /// Children run in order over a shared buffer
    Serial {
        #[serde(default)]
        tasks: Vec<TaskConfig>,
    },

    /// Children run on copies of the input; scores are summed per pair
    Aggregator {
        #[serde(default)]
        tasks: Vec<TaskConfig>,
    },

    /// Filter splits the input; each side runs its own task
    Branching {
        filter: FilterConfig,
        on_match: Box<TaskConfig>,
        on_remainder: Box<TaskConfig>,
    },

    Operator {
        operator: OperatorConfig,
    },

    Equalizer {
        equalizer: EqualizerConfig,
    },

    Filter {
        filter: FilterConfig,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorConfig {
    Fixed {
        difference: Score,
    },

    Offset {
        offset: Score,
    },

    /// Compares single map entries
    MapEntry {
        #[serde(rename = "match", default)]
        mode: EntryMatch,
        #[serde(default)]
        penalties: Penalties,
    },

    /// Compares map records; `entry_task` replaces the default entry step
    Map {
        #[serde(rename = "match", default)]
        mode: EntryMatch,
        #[serde(default)]
        penalties: Penalties,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entry_task: Option<Box<TaskConfig>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EqualizerConfig {
    Binary {
        low: Score,
        high: Score,
    },

    Linear {
        range: Score,
        #[serde(default)]
        offset: Score,
    },

    Exponential {
        range: Score,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    Identity,
    Blockade,
    Count { count: usize },
    Percent { percent: f64 },
    Threshold { threshold: Score },
    /// Everything the inner filter drops
    Invert { filter: Box<FilterConfig> },
}

impl TaskConfig {
    /// Parse a pipeline description from JSON text
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if the text is not a valid
    /// description.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Build a fresh pipeline and return it with the handle of its root task
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` for invalid penalties, or any
    /// structural error raised while wiring the tree.
    pub fn build(&self) -> Result<(Pipeline, TaskId)> {
        let mut pipeline = Pipeline::new();
        let root = self.build_into(&mut pipeline)?;
        Ok((pipeline, root))
    }

    /// Add this description to an existing pipeline as a new detached sub-tree
    ///
    /// # Errors
    ///
    /// Same conditions as [`TaskConfig::build`].
    pub fn build_into(&self, pipeline: &mut Pipeline) -> Result<TaskId> {
        match self {
            Self::Serial { tasks } => {
                let id = pipeline.add_serial();
                for task in tasks {
                    let child = task.build_into(pipeline)?;
                    pipeline.add_child(id, child)?;
                }
                Ok(id)
            }
            Self::Aggregator { tasks } => {
                let id = pipeline.add_aggregator();
                for task in tasks {
                    let child = task.build_into(pipeline)?;
                    pipeline.add_child(id, child)?;
                }
                Ok(id)
            }
            Self::Branching {
                filter,
                on_match,
                on_remainder,
            } => {
                let on_match = on_match.build_into(pipeline)?;
                let on_remainder = on_remainder.build_into(pipeline)?;
                let id = pipeline.add_boxed_branching(filter.build());
                pipeline.set_match_task(id, on_match)?;
                pipeline.set_remainder_task(id, on_remainder)?;
                Ok(id)
            }
            Self::Operator { operator } => {
                let batch = BatchOperator::from_boxed(operator.build()?);
                Ok(pipeline.add_processor(batch))
            }
            Self::Equalizer { equalizer } => {
                let batch = BatchEqualizer::from_boxed(equalizer.build());
                Ok(pipeline.add_processor(batch))
            }
            Self::Filter { filter } => Ok(pipeline.add_boxed_processor(filter.build())),
        }
    }
}

impl OperatorConfig {
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if the penalties are invalid or
    /// the entry task cannot be built.
    pub fn build(&self) -> Result<Box<dyn Operator>> {
        let operator: Box<dyn Operator> = match self {
            Self::Fixed { difference } => Box::new(FixedOperator::new(*difference)),
            Self::Offset { offset } => Box::new(OffsetOperator::new(*offset)),
            Self::MapEntry { mode, penalties } => {
                Box::new(MapEntryOperator::new(*mode).with_penalties(penalties.validated()?))
            }
            Self::Map {
                mode,
                penalties,
                entry_task,
            } => {
                let penalties = penalties.validated()?;
                match entry_task {
                    Some(entry_task) => {
                        let (pipeline, root) = entry_task.build()?;
                        Box::new(MapOperator::with_entry_task(pipeline, root, penalties))
                    }
                    None => Box::new(MapOperator::with_penalties(*mode, penalties)),
                }
            }
        };
        Ok(operator)
    }
}

impl EqualizerConfig {
    #[must_use]
    pub fn build(&self) -> Box<dyn Equalizer> {
        match *self {
            Self::Binary { low, high } => Box::new(BinaryEqualizer::new(low, high)),
            Self::Linear { range, offset } => Box::new(LinearEqualizer::with_offset(range, offset)),
            Self::Exponential { range } => Box::new(ExponentialEqualizer::new(range)),
        }
    }
}

impl FilterConfig {
    #[must_use]
    pub fn build(&self) -> Box<dyn Processor> {
        match self {
            Self::Identity => Box::new(IdentityFilter),
            Self::Blockade => Box::new(BlockadeFilter),
            Self::Count { count } => Box::new(CountFilter::new(*count)),
            Self::Percent { percent } => Box::new(PercentFilter::new(*percent)),
            Self::Threshold { threshold } => Box::new(ThresholdFilter::new(*threshold)),
            Self::Invert { filter } => Box::new(Inverter::from_boxed(filter.build())),
        }
    }
}
