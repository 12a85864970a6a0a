use thiserror::Error;

use crate::core::item::Shape;
use crate::task::pipeline::TaskId;

/// Which side of a branching task is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Match,
    Remainder,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Remainder => write!(f, "remainder"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Circular dependency: task {child} is an ancestor of task {parent}")]
    CycleDetected { parent: TaskId, child: TaskId },

    #[error("Task {child} is already attached to task {parent}")]
    AlreadyAttached { child: TaskId, parent: TaskId },

    #[error("Task {0} cannot own child tasks")]
    NotComposite(TaskId),

    #[error("Task {0} is not a branching task")]
    NotBranching(TaskId),

    #[error("Branching task {task} has no {branch} task")]
    MissingBranch { task: TaskId, branch: Branch },

    #[error("Unknown task handle {0}")]
    UnknownTask(TaskId),

    #[error("{operator} expects {expected} items, got {found}")]
    ShapeMismatch {
        operator: &'static str,
        expected: Shape,
        found: Shape,
    },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
