//! Arena-backed task tree.
//!
//! Every node lives in a [`Pipeline`] and is addressed by a [`TaskId`]. A node
//! records its parent as an optional handle; composite nodes record their
//! children as handles. Data moves between nodes only through the parent link:
//!
//! 1. `execute(node)` pulls the parent's buffer (or, for a root, takes the
//!    node's own buffer as filled by `push`)
//! 2. the node's logic runs over that buffer
//! 3. the result is pushed back to the parent (or kept in the root's buffer,
//!    where `pull` retrieves it)
//!
//! A serial node therefore behaves as function composition: each child pulls
//! the serial node's buffer, transforms it and pushes it back before the next
//! child runs.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::core::error::{Branch, PipelineError, Result};
use crate::core::pair::{self, Pair, PairId};
use crate::matching::batch::{BatchEqualizer, BatchOperator};
use crate::matching::equalizer::Equalizer;
use crate::matching::filter::Processor;
use crate::matching::map_operator::MapOperator;
use crate::matching::operator::{EntryMatch, Operator};

/// Handle to a task inside a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

impl TaskId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a task node does, without its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Leaf wrapping a filter, batch operator or batch equalizer
    Processor,
    /// Runs its children in order over a shared buffer
    Serial,
    /// Splits its input with a filter and runs one task per side
    Branching,
    /// Runs every child on a copy of the input and sums scores per pair
    Aggregator,
}

enum NodeLogic {
    Processor(Box<dyn Processor>),
    Serial(Vec<TaskId>),
    Branching {
        filter: Box<dyn Processor>,
        on_match: Option<TaskId>,
        on_remainder: Option<TaskId>,
    },
    Aggregator(Vec<TaskId>),
}

impl NodeLogic {
    fn kind(&self) -> TaskKind {
        match self {
            Self::Processor(_) => TaskKind::Processor,
            Self::Serial(_) => TaskKind::Serial,
            Self::Branching { .. } => TaskKind::Branching,
            Self::Aggregator(_) => TaskKind::Aggregator,
        }
    }
}

struct TaskNode {
    parent: Option<TaskId>,
    logic: NodeLogic,
    buffer: Vec<Pair>,
}

/// A tree (or forest) of tasks and the buffers flowing through them
#[derive(Default)]
pub struct Pipeline {
    nodes: Vec<TaskNode>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of task nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_node(&mut self, logic: NodeLogic) -> TaskId {
        let id = TaskId(self.nodes.len());
        self.nodes.push(TaskNode {
            parent: None,
            logic,
            buffer: Vec::new(),
        });
        id
    }

    /// Leaf task running a processor (usually a filter)
    pub fn add_processor(&mut self, processor: impl Processor + 'static) -> TaskId {
        self.add_boxed_processor(Box::new(processor))
    }

    pub fn add_boxed_processor(&mut self, processor: Box<dyn Processor>) -> TaskId {
        self.add_node(NodeLogic::Processor(processor))
    }

    /// Leaf task applying an operator to every pair
    pub fn add_operator(&mut self, operator: impl Operator + 'static) -> TaskId {
        self.add_processor(BatchOperator::new(operator))
    }

    /// Leaf task equalizing the scores of the whole buffer
    pub fn add_equalizer(&mut self, equalizer: impl Equalizer + 'static) -> TaskId {
        self.add_processor(BatchEqualizer::new(equalizer))
    }

    /// Leaf task comparing map records with the default entry task for `mode`
    pub fn add_map_operator(&mut self, mode: EntryMatch) -> TaskId {
        self.add_operator(MapOperator::new(mode))
    }

    pub fn add_serial(&mut self) -> TaskId {
        self.add_node(NodeLogic::Serial(Vec::new()))
    }

    pub fn add_aggregator(&mut self) -> TaskId {
        self.add_node(NodeLogic::Aggregator(Vec::new()))
    }

    /// Branching task deciding with `filter`; both branches still need setting
    pub fn add_branching(&mut self, filter: impl Processor + 'static) -> TaskId {
        self.add_boxed_branching(Box::new(filter))
    }

    pub fn add_boxed_branching(&mut self, filter: Box<dyn Processor>) -> TaskId {
        self.add_node(NodeLogic::Branching {
            filter,
            on_match: None,
            on_remainder: None,
        })
    }

    /// Branching task with both branches wired
    ///
    /// # Errors
    ///
    /// Fails without adding anything if either branch is unknown or already
    /// attached (`PipelineError::AlreadyAttached`), or if both branches are the
    /// same task (`PipelineError::InvalidConfig`).
    pub fn add_branching_with(
        &mut self,
        filter: impl Processor + 'static,
        on_match: TaskId,
        on_remainder: TaskId,
    ) -> Result<TaskId> {
        for branch in [on_match, on_remainder] {
            if let Some(parent) = self.node(branch)?.parent {
                return Err(PipelineError::AlreadyAttached {
                    child: branch,
                    parent,
                });
            }
        }

        if on_match == on_remainder {
            return Err(PipelineError::InvalidConfig(format!(
                "task {on_match} cannot be both branches of one branching task"
            )));
        }

        let id = self.add_branching(filter);

        self.set_match_task(id, on_match)?;
        self.set_remainder_task(id, on_remainder)?;
        Ok(id)
    }

    fn node(&self, id: TaskId) -> Result<&TaskNode> {
        self.nodes.get(id.0).ok_or(PipelineError::UnknownTask(id))
    }

    fn node_mut(&mut self, id: TaskId) -> Result<&mut TaskNode> {
        self.nodes.get_mut(id.0).ok_or(PipelineError::UnknownTask(id))
    }

    /// # Errors
    ///
    /// Returns `PipelineError::UnknownTask` for a foreign handle.
    pub fn kind(&self, id: TaskId) -> Result<TaskKind> {
        Ok(self.node(id)?.logic.kind())
    }

    /// # Errors
    ///
    /// Returns `PipelineError::UnknownTask` for a foreign handle.
    pub fn parent(&self, id: TaskId) -> Result<Option<TaskId>> {
        Ok(self.node(id)?.parent)
    }

    /// Children of a task in execution order (match before remainder)
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownTask` for a foreign handle.
    pub fn children(&self, id: TaskId) -> Result<Vec<TaskId>> {
        Ok(match &self.node(id)?.logic {
            NodeLogic::Processor(_) => Vec::new(),
            NodeLogic::Serial(children) | NodeLogic::Aggregator(children) => children.clone(),
            NodeLogic::Branching {
                on_match,
                on_remainder,
                ..
            } => on_match.iter().chain(on_remainder.iter()).copied().collect(),
        })
    }

    /// Set `child`'s parent after checking the attachment is legal
    ///
    /// Walks up from `parent`; reaching `child` means the attachment would
    /// close a loop. Only the single upward path is inspected.
    fn attach(&mut self, parent: TaskId, child: TaskId) -> Result<()> {
        self.node(parent)?;

        if let Some(existing) = self.node(child)?.parent {
            return Err(PipelineError::AlreadyAttached {
                child,
                parent: existing,
            });
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(PipelineError::CycleDetected { parent, child });
            }
            cursor = self.node(current)?.parent;
        }

        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Append `child` to a serial or aggregator task
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotComposite` if `parent` cannot own children,
    /// `PipelineError::CycleDetected` if `child` is an ancestor of `parent`, or
    /// `PipelineError::AlreadyAttached` if `child` already has a parent. The
    /// tree is unchanged on error.
    pub fn add_child(&mut self, parent: TaskId, child: TaskId) -> Result<()> {
        match self.node(parent)?.logic {
            NodeLogic::Serial(_) | NodeLogic::Aggregator(_) => {}
            NodeLogic::Processor(_) | NodeLogic::Branching { .. } => {
                return Err(PipelineError::NotComposite(parent));
            }
        }

        self.attach(parent, child)?;

        match &mut self.node_mut(parent)?.logic {
            NodeLogic::Serial(children) | NodeLogic::Aggregator(children) => children.push(child),
            NodeLogic::Processor(_) | NodeLogic::Branching { .. } => {}
        }
        Ok(())
    }

    /// Task run over the pairs the branching filter selects
    ///
    /// # Errors
    ///
    /// Same conditions as [`Pipeline::add_child`], with
    /// `PipelineError::NotBranching` for a non-branching `branch`.
    pub fn set_match_task(&mut self, branch: TaskId, child: TaskId) -> Result<()> {
        self.set_branch(branch, Branch::Match, child)
    }

    /// Task run over the pairs the branching filter leaves out
    ///
    /// # Errors
    ///
    /// Same conditions as [`Pipeline::set_match_task`].
    pub fn set_remainder_task(&mut self, branch: TaskId, child: TaskId) -> Result<()> {
        self.set_branch(branch, Branch::Remainder, child)
    }

    /// # Errors
    ///
    /// Returns `PipelineError::NotBranching` for a non-branching task.
    pub fn match_task(&self, branch: TaskId) -> Result<Option<TaskId>> {
        self.branch_slot(branch, Branch::Match)
    }

    /// # Errors
    ///
    /// Returns `PipelineError::NotBranching` for a non-branching task.
    pub fn remainder_task(&self, branch: TaskId) -> Result<Option<TaskId>> {
        self.branch_slot(branch, Branch::Remainder)
    }

    fn branch_slot(&self, branch: TaskId, side: Branch) -> Result<Option<TaskId>> {
        match &self.node(branch)?.logic {
            NodeLogic::Branching {
                on_match,
                on_remainder,
                ..
            } => Ok(match side {
                Branch::Match => *on_match,
                Branch::Remainder => *on_remainder,
            }),
            _ => Err(PipelineError::NotBranching(branch)),
        }
    }

    fn set_branch(&mut self, branch: TaskId, side: Branch, child: TaskId) -> Result<()> {
        let previous = self.branch_slot(branch, side)?;
        if previous == Some(child) {
            return Ok(());
        }

        self.attach(branch, child)?;

        if let Some(previous) = previous {
            self.node_mut(previous)?.parent = None;
        }

        if let NodeLogic::Branching {
            on_match,
            on_remainder,
            ..
        } = &mut self.node_mut(branch)?.logic
        {
            match side {
                Branch::Match => *on_match = Some(child),
                Branch::Remainder => *on_remainder = Some(child),
            }
        }
        Ok(())
    }

    /// Store `data` as the input of the task's next `execute`
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownTask` for a foreign handle.
    pub fn push(&mut self, id: TaskId, data: Vec<Pair>) -> Result<()> {
        self.node_mut(id)?.buffer = data;
        Ok(())
    }

    /// Take the task's current buffer, leaving it empty
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownTask` for a foreign handle.
    pub fn pull(&mut self, id: TaskId) -> Result<Vec<Pair>> {
        Ok(std::mem::take(&mut self.node_mut(id)?.buffer))
    }

    /// Run a task through its parent link
    ///
    /// A task with a parent pulls its input from the parent and pushes the
    /// result back; a root task works on whatever was last pushed to it.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingBranch` for an incomplete branching task
    /// anywhere below `id`, and propagates operator errors.
    pub fn execute(&mut self, id: TaskId) -> Result<()> {
        let parent = self.node(id)?.parent;

        let input = match parent {
            Some(parent) => self.pull(parent)?,
            None => self.pull(id)?,
        };

        debug!(task = %id, pairs = input.len(), "executing task");
        let output = self.run(id, input)?;
        debug!(task = %id, pairs = output.len(), "task finished");

        match parent {
            Some(parent) => self.push(parent, output),
            None => self.push(id, output),
        }
    }

    /// Run a task over `data` in isolation and return its result
    ///
    /// The task's parent link is ignored, so any node of the tree (or a whole
    /// sub-tree) can be reused as a function over a collection. Input pushed
    /// to the task and not yet executed is left in place.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Pipeline::execute`].
    pub fn run_task(&mut self, id: TaskId, data: Vec<Pair>) -> Result<Vec<Pair>> {
        self.run(id, data)
    }

    fn run(&mut self, id: TaskId, input: Vec<Pair>) -> Result<Vec<Pair>> {
        let node = self.node_mut(id)?;
        match &mut node.logic {
            NodeLogic::Processor(processor) => processor.execute(input),
            NodeLogic::Serial(children) => {
                let children = children.clone();
                self.run_serial(id, &children, input)
            }
            NodeLogic::Branching {
                filter,
                on_match,
                on_remainder,
            } => {
                let on_match = on_match.ok_or(PipelineError::MissingBranch {
                    task: id,
                    branch: Branch::Match,
                })?;
                let on_remainder = on_remainder.ok_or(PipelineError::MissingBranch {
                    task: id,
                    branch: Branch::Remainder,
                })?;

                let matched = filter.execute(pair::copy_all(&input))?;
                let remainder = pair::difference(input, &matched);
                trace!(
                    task = %id,
                    matched = matched.len(),
                    remainder = remainder.len(),
                    "branching"
                );

                let mut output = self.run_task(on_match, matched)?;
                output.extend(self.run_task(on_remainder, remainder)?);
                Ok(output)
            }
            NodeLogic::Aggregator(children) => {
                let children = children.clone();
                self.run_aggregator(id, &children, input)
            }
        }
    }

    /// Children work in the serial node's own buffer; whatever was pushed to
    /// it before the run is put back afterwards, on success or failure.
    fn run_serial(&mut self, id: TaskId, children: &[TaskId], input: Vec<Pair>) -> Result<Vec<Pair>> {
        let pending = std::mem::replace(&mut self.node_mut(id)?.buffer, input);
        let outcome = children.iter().try_for_each(|&child| self.execute(child));
        let output = std::mem::replace(&mut self.node_mut(id)?.buffer, pending);
        outcome.map(|()| output)
    }

    /// Sum per-pair scores over every child, each run on a fresh copy
    ///
    /// The sum saturates at the `Score` bounds.
    /// Results are merged back by pair identity, never by score or contents.
    fn run_aggregator(
        &mut self,
        id: TaskId,
        children: &[TaskId],
        mut input: Vec<Pair>,
    ) -> Result<Vec<Pair>> {
        let snapshot = pair::copy_all(&input);

        let mut index: HashMap<PairId, usize> = HashMap::with_capacity(input.len());
        for (position, pair) in input.iter_mut().enumerate() {
            pair.set_score(0);
            index.entry(pair.id()).or_insert(position);
        }

        for &child in children {
            let results = self.run_task(child, pair::copy_all(&snapshot))?;
            trace!(task = %id, child = %child, pairs = results.len(), "merging aggregate");

            for result in &results {
                match index.get(&result.id()) {
                    Some(&position) => {
                        let merged = input[position].score().saturating_add(result.score());
                        input[position].set_score(merged);
                    }
                    None => {
                        warn!(task = %id, pair = %result.id(), "aggregated result has no input pair");
                    }
                }
            }
        }

        Ok(input)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().enumerate().map(|(i, node)| {
                (TaskId(i), node.logic.kind(), node.parent, node.buffer.len())
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generator::{generate_single, items};
    use crate::core::item::Item;
    use crate::core::pair::Score;
    use crate::matching::equalizer::LinearEqualizer;
    use crate::matching::filter::{BlockadeFilter, CountFilter, IdentityFilter, PercentFilter};
    use crate::matching::operator::{FixedOperator, OffsetOperator, DEFAULT_KEY_PENALTY};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn input() -> Vec<Pair> {
        let base = Arc::new(Item::record(json!("base")));
        let candidates = items([json!("c1"), json!("c2"), json!("c3"), json!("c4"), json!("c5")]);
        generate_single(&base, &candidates)
    }

    /// Processor counting how often it runs
    struct Counter(Rc<Cell<usize>>);

    impl Processor for Counter {
        fn execute(&mut self, pairs: Vec<Pair>) -> Result<Vec<Pair>> {
            self.0.set(self.0.get() + 1);
            Ok(pairs)
        }
    }

    fn exec(pipeline: &mut Pipeline, root: TaskId, data: Vec<Pair>) -> Vec<Pair> {
        pipeline.push(root, data).unwrap();
        pipeline.execute(root).unwrap();
        pipeline.pull(root).unwrap()
    }

    #[test]
    fn test_circular_dependency() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let child = pipeline.add_serial();
        let grand_child = pipeline.add_serial();

        pipeline.add_child(serial, child).unwrap();
        pipeline.add_child(child, grand_child).unwrap();

        let err = pipeline.add_child(grand_child, serial).unwrap_err();
        assert_eq!(
            err,
            PipelineError::CycleDetected {
                parent: grand_child,
                child: serial
            }
        );

        // tree unchanged
        assert_eq!(pipeline.parent(serial).unwrap(), None);
        assert!(pipeline.children(grand_child).unwrap().is_empty());
    }

    #[test]
    fn test_self_attachment_rejected() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        assert!(matches!(
            pipeline.add_child(serial, serial),
            Err(PipelineError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_reattachment_rejected() {
        let mut pipeline = Pipeline::new();
        let first = pipeline.add_serial();
        let second = pipeline.add_serial();
        let leaf = pipeline.add_processor(IdentityFilter);

        pipeline.add_child(first, leaf).unwrap();
        let err = pipeline.add_child(second, leaf).unwrap_err();
        assert_eq!(
            err,
            PipelineError::AlreadyAttached {
                child: leaf,
                parent: first
            }
        );
        assert!(pipeline.children(second).unwrap().is_empty());
    }

    #[test]
    fn test_leaf_cannot_own_children() {
        let mut pipeline = Pipeline::new();
        let leaf = pipeline.add_processor(IdentityFilter);
        let other = pipeline.add_processor(IdentityFilter);
        assert_eq!(
            pipeline.add_child(leaf, other),
            Err(PipelineError::NotComposite(leaf))
        );
        assert_eq!(pipeline.parent(other).unwrap(), None);
    }

    #[test]
    fn test_unknown_handle() {
        let mut other = Pipeline::new();
        other.add_serial();
        let foreign = other.add_serial();

        let mut pipeline = Pipeline::new();
        assert_eq!(
            pipeline.execute(foreign),
            Err(PipelineError::UnknownTask(foreign))
        );
    }

    #[test]
    fn test_single_task() {
        let counter = Rc::new(Cell::new(0));
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let task = pipeline.add_processor(Counter(Rc::clone(&counter)));
        pipeline.add_child(serial, task).unwrap();

        pipeline.execute(serial).unwrap();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_multi_task() {
        let counter = Rc::new(Cell::new(0));
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        for _ in 0..3 {
            let task = pipeline.add_processor(Counter(Rc::clone(&counter)));
            pipeline.add_child(serial, task).unwrap();
        }

        pipeline.execute(serial).unwrap();
        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn test_recursive_task() {
        let counter = Rc::new(Cell::new(0));
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let child = pipeline.add_serial();
        let grand_child = pipeline.add_serial();

        let counted = |pipeline: &mut Pipeline, parent: TaskId| {
            let task = pipeline.add_processor(Counter(Rc::clone(&counter)));
            pipeline.add_child(parent, task).unwrap();
        };

        counted(&mut pipeline, serial);
        counted(&mut pipeline, serial);
        pipeline.add_child(serial, child).unwrap();
        counted(&mut pipeline, child);
        counted(&mut pipeline, child);
        pipeline.add_child(child, grand_child).unwrap();
        counted(&mut pipeline, grand_child);
        counted(&mut pipeline, serial);

        pipeline.execute(serial).unwrap();
        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_serial_composes_in_order() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let fixed = pipeline.add_operator(FixedOperator::new(10));
        let offset = pipeline.add_operator(OffsetOperator::new(5));
        let keep = pipeline.add_processor(CountFilter::new(2));
        pipeline.add_child(serial, fixed).unwrap();
        pipeline.add_child(serial, offset).unwrap();
        pipeline.add_child(serial, keep).unwrap();

        let output = exec(&mut pipeline, serial, input());
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|p| p.score() == 15));
    }

    #[test]
    fn test_pipeline_is_reusable() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let offset = pipeline.add_operator(OffsetOperator::new(1));
        pipeline.add_child(serial, offset).unwrap();

        let first = exec(&mut pipeline, serial, input());
        let second = exec(&mut pipeline, serial, input());

        assert!(first.iter().all(|p| p.score() == 1));
        assert!(second.iter().all(|p| p.score() == 1));
        assert!(first.iter().all(|p| !second.contains(p)));
    }

    #[test]
    fn test_child_execute_uses_parent_buffer() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let fixed = pipeline.add_operator(FixedOperator::new(4));
        pipeline.add_child(serial, fixed).unwrap();

        pipeline.push(serial, input()).unwrap();
        // running the child alone reads from and writes back to the parent
        pipeline.execute(fixed).unwrap();

        let output = pipeline.pull(serial).unwrap();
        assert_eq!(output.len(), 5);
        assert!(output.iter().all(|p| p.score() == 4));
    }

    #[test]
    fn test_run_task_keeps_pending_input() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let fixed = pipeline.add_operator(FixedOperator::new(4));
        pipeline.add_child(serial, fixed).unwrap();

        let pending = input();
        pipeline.push(serial, pending.clone()).unwrap();

        let output = pipeline.run_task(serial, input()).unwrap();
        assert!(output.iter().all(|p| p.score() == 4));
        assert!(output.iter().all(|p| !pending.contains(p)));

        let pulled = pipeline.pull(serial).unwrap();
        assert_eq!(pulled, pending);
        assert!(pulled.iter().all(|p| p.score() == 0));
    }

    #[test]
    fn test_failed_run_task_keeps_pending_input() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let branch = pipeline.add_branching(IdentityFilter);
        pipeline.add_child(serial, branch).unwrap();

        let pending = input();
        pipeline.push(serial, pending.clone()).unwrap();

        assert!(pipeline.run_task(serial, input()).is_err());
        assert_eq!(pipeline.pull(serial).unwrap(), pending);
    }

    #[test]
    fn test_branching_runs_both_sides() {
        let counter = Rc::new(Cell::new(0));
        let mut pipeline = Pipeline::new();
        let on_match = pipeline.add_processor(Counter(Rc::clone(&counter)));
        let on_remainder = pipeline.add_processor(Counter(Rc::clone(&counter)));
        let branch = pipeline
            .add_branching_with(IdentityFilter, on_match, on_remainder)
            .unwrap();

        exec(&mut pipeline, branch, input());
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_branching_data_consistency() {
        let mut pipeline = Pipeline::new();
        let branch = pipeline.add_branching(CountFilter::new(1));
        let on_match = pipeline.add_processor(IdentityFilter);
        let on_remainder = pipeline.add_processor(IdentityFilter);
        pipeline.set_match_task(branch, on_match).unwrap();
        pipeline.set_remainder_task(branch, on_remainder).unwrap();

        let data = input();
        let output = exec(&mut pipeline, branch, data.clone());
        assert_eq!(output.len(), data.len());
        assert!(data.iter().all(|p| output.contains(p)));
    }

    #[test]
    fn test_branching_match_only() {
        let mut pipeline = Pipeline::new();
        let on_match = pipeline.add_processor(IdentityFilter);
        let on_remainder = pipeline.add_processor(BlockadeFilter);
        let branch = pipeline
            .add_branching_with(CountFilter::new(1), on_match, on_remainder)
            .unwrap();

        assert_eq!(exec(&mut pipeline, branch, input()).len(), 1);
    }

    #[test]
    fn test_branching_remainder_only() {
        let mut pipeline = Pipeline::new();
        let on_match = pipeline.add_processor(BlockadeFilter);
        let on_remainder = pipeline.add_processor(IdentityFilter);
        let branch = pipeline
            .add_branching_with(CountFilter::new(1), on_match, on_remainder)
            .unwrap();

        assert_eq!(exec(&mut pipeline, branch, input()).len(), 4);
    }

    #[test]
    fn test_branching_recursive() {
        let mut pipeline = Pipeline::new();
        let branch = pipeline.add_branching(CountFilter::new(2));
        let branch_a = pipeline.add_branching(CountFilter::new(1));
        let branch_b = pipeline.add_branching(CountFilter::new(1));
        pipeline.set_match_task(branch, branch_a).unwrap();
        pipeline.set_remainder_task(branch, branch_b).unwrap();

        let a_match = pipeline.add_processor(BlockadeFilter);
        let a_rest = pipeline.add_processor(IdentityFilter);
        pipeline.set_match_task(branch_a, a_match).unwrap();
        pipeline.set_remainder_task(branch_a, a_rest).unwrap();

        let b_match = pipeline.add_processor(IdentityFilter);
        let b_rest = pipeline.add_processor(BlockadeFilter);
        pipeline.set_match_task(branch_b, b_match).unwrap();
        pipeline.set_remainder_task(branch_b, b_rest).unwrap();

        assert_eq!(exec(&mut pipeline, branch, input()).len(), 2);
    }

    #[test]
    fn test_branching_missing_branch() {
        let mut pipeline = Pipeline::new();
        let branch = pipeline.add_branching(IdentityFilter);
        let on_match = pipeline.add_processor(IdentityFilter);
        pipeline.set_match_task(branch, on_match).unwrap();

        pipeline.push(branch, input()).unwrap();
        assert_eq!(
            pipeline.execute(branch),
            Err(PipelineError::MissingBranch {
                task: branch,
                branch: Branch::Remainder
            })
        );
    }

    #[test]
    fn test_branch_replacement_detaches_previous() {
        let mut pipeline = Pipeline::new();
        let branch = pipeline.add_branching(IdentityFilter);
        let first = pipeline.add_processor(IdentityFilter);
        let second = pipeline.add_processor(IdentityFilter);

        pipeline.set_match_task(branch, first).unwrap();
        pipeline.set_match_task(branch, second).unwrap();

        assert_eq!(pipeline.match_task(branch).unwrap(), Some(second));
        assert_eq!(pipeline.parent(first).unwrap(), None);
        assert_eq!(pipeline.parent(second).unwrap(), Some(branch));
    }

    #[test]
    fn test_branching_same_task_twice_rejected() {
        let mut pipeline = Pipeline::new();
        let leaf = pipeline.add_processor(IdentityFilter);
        let before = pipeline.len();

        assert!(pipeline.add_branching_with(IdentityFilter, leaf, leaf).is_err());
        assert_eq!(pipeline.len(), before);
        assert_eq!(pipeline.parent(leaf).unwrap(), None);
    }

    #[test]
    fn test_branch_setters_require_branching_task() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let leaf = pipeline.add_processor(IdentityFilter);
        assert_eq!(
            pipeline.set_match_task(serial, leaf),
            Err(PipelineError::NotBranching(serial))
        );

        let branch = pipeline.add_branching(IdentityFilter);
        assert_eq!(
            pipeline.add_child(branch, leaf),
            Err(PipelineError::NotComposite(branch))
        );
    }

    #[test]
    fn test_aggregator_without_children() {
        let mut pipeline = Pipeline::new();
        let aggregator = pipeline.add_aggregator();

        let data: Vec<Pair> = input().iter().map(|p| p.with_score(9)).collect();
        let output = exec(&mut pipeline, aggregator, data);

        assert_eq!(output.len(), 5);
        assert!(output.iter().all(|p| p.score() == 0), "score set to zero");
    }

    #[test]
    fn test_aggregator_sums_children() {
        let mut pipeline = Pipeline::new();
        let aggregator = pipeline.add_aggregator();
        let fixed = pipeline.add_operator(FixedOperator::new(1));
        let offset = pipeline.add_operator(OffsetOperator::new(2));
        pipeline.add_child(aggregator, fixed).unwrap();
        pipeline.add_child(aggregator, offset).unwrap();

        let output = exec(&mut pipeline, aggregator, input());

        assert_eq!(output.len(), 5);
        assert!(output.iter().all(|p| p.score() == 3));
    }

    #[test]
    fn test_aggregator_sum_saturates() {
        let mut pipeline = Pipeline::new();
        let aggregator = pipeline.add_aggregator();
        let largest = pipeline.add_operator(FixedOperator::new(Score::MAX));
        let one = pipeline.add_operator(FixedOperator::new(1));
        pipeline.add_child(aggregator, largest).unwrap();
        pipeline.add_child(aggregator, one).unwrap();

        let output = exec(&mut pipeline, aggregator, input());

        assert_eq!(output.len(), 5);
        assert!(output.iter().all(|p| p.score() == Score::MAX));
    }

    #[test]
    fn test_aggregator_equalized() {
        let mut pipeline = Pipeline::new();
        let equalized = pipeline.add_serial();

        let mut counter: Score = 0;
        let counting = pipeline.add_operator(move |_: &Pair| -> Result<Score> {
            let value = counter;
            counter += 1;
            Ok(value)
        });
        let linear = pipeline.add_equalizer(LinearEqualizer::new(8));
        pipeline.add_child(equalized, counting).unwrap();
        pipeline.add_child(equalized, linear).unwrap();

        let aggregator = pipeline.add_aggregator();
        let offset = pipeline.add_operator(OffsetOperator::new(2));
        pipeline.add_child(aggregator, equalized).unwrap();
        pipeline.add_child(aggregator, offset).unwrap();

        let output = exec(&mut pipeline, aggregator, input());

        assert_eq!(output.len(), 5);
        let min = output.iter().map(Pair::score).min().unwrap();
        let max = output.iter().map(Pair::score).max().unwrap();
        assert_eq!(min, 2, "minimum score");
        assert_eq!(max, 10, "maximum score");
    }

    #[test]
    fn test_aggregator_keeps_similar_pairs_apart() {
        let mut data = input();
        let first = data[0].clone();
        data.push(Pair::new(
            Arc::new(first.base().clone()),
            Arc::new(first.candidate().clone()),
        ));

        let mut pipeline = Pipeline::new();
        let aggregator = pipeline.add_aggregator();
        let fixed = pipeline.add_operator(FixedOperator::new(1));
        pipeline.add_child(aggregator, fixed).unwrap();

        let output = exec(&mut pipeline, aggregator, data);

        assert_eq!(output.len(), 6);
        assert!(output.iter().all(|p| p.score() == 1));
    }

    #[test]
    fn test_aggregator_merges_by_identity_after_reordering() {
        let mut pipeline = Pipeline::new();
        let aggregator = pipeline.add_aggregator();

        // child scores in descending order, so ranking reverses the collection
        let ranked = pipeline.add_serial();
        let mut next: Score = 60;
        let scoring = pipeline.add_operator(move |_: &Pair| -> Result<Score> {
            next -= 10;
            Ok(next)
        });
        let reorder = pipeline.add_processor(CountFilter::new(5));
        pipeline.add_child(ranked, scoring).unwrap();
        pipeline.add_child(ranked, reorder).unwrap();
        pipeline.add_child(aggregator, ranked).unwrap();

        let data = input();
        let ids: Vec<PairId> = data.iter().map(Pair::id).collect();
        let output = exec(&mut pipeline, aggregator, data);

        // input order survives and every pair gets its own score back
        assert_eq!(output.iter().map(Pair::id).collect::<Vec<_>>(), ids);
        let scores: Vec<Score> = output.iter().map(Pair::score).collect();
        assert_eq!(scores, vec![50, 40, 30, 20, 10]);
    }

    #[test]
    fn test_query_with_percent_filter() {
        let base = Arc::new(Item::record(json!({"key": "value"})));
        let candidates = items([
            json!({}),
            json!({"key": "value"}),
            json!({"key": "valueDifferent", "key2": "value2"}),
        ]);

        let mut pipeline = Pipeline::new();
        let query = pipeline.add_serial();
        let compare = pipeline.add_map_operator(EntryMatch::Key);
        pipeline.add_child(query, compare).unwrap();

        let mut results = exec(&mut pipeline, query, generate_single(&base, &candidates));
        pair::rank(&mut results);
        let scores: Vec<Score> = results.iter().map(Pair::score).collect();
        assert_eq!(scores, vec![0, 0, DEFAULT_KEY_PENALTY]);

        let top = pipeline.add_processor(PercentFilter::new(0.33));
        pipeline.add_child(query, top).unwrap();

        let results = exec(&mut pipeline, query, generate_single(&base, &candidates));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score(), 0);
    }

    #[test]
    fn test_kind_and_children() {
        let mut pipeline = Pipeline::new();
        let serial = pipeline.add_serial();
        let aggregator = pipeline.add_aggregator();
        let leaf = pipeline.add_processor(IdentityFilter);
        pipeline.add_child(serial, aggregator).unwrap();
        pipeline.add_child(aggregator, leaf).unwrap();

        assert_eq!(pipeline.kind(serial).unwrap(), TaskKind::Serial);
        assert_eq!(pipeline.kind(aggregator).unwrap(), TaskKind::Aggregator);
        assert_eq!(pipeline.kind(leaf).unwrap(), TaskKind::Processor);
        assert_eq!(pipeline.children(serial).unwrap(), vec![aggregator]);
        assert_eq!(pipeline.parent(leaf).unwrap(), Some(aggregator));
    }
}
