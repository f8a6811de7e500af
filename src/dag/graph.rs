// src/dag/graph.rs

//! The run graph: the DAG the scheduler actually executes.
//!
//! Nodes live in a vector and reference each other by index, which keeps
//! the mutually-referencing graph out of `Rc` territory. Each node tracks
//! both directions of every edge so the scheduler can walk predecessors
//! for readiness and the builder can populate dependents cheaply.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::errors::ModuleError;
use crate::module::{Module, Modules};

/// How edges are laid out for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Dependencies run before their dependents.
    Normal,
    /// Dependents run before their dependencies (teardown order).
    Reverse,
    /// No ordering at all: every module is immediately eligible.
    Unordered,
}

/// Per-run state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Not all predecessors are terminal yet.
    Waiting,
    /// Eligible to run, waiting for a worker slot.
    Ready,
    /// Hook currently executing on a worker.
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeState::Succeeded | NodeState::Failed | NodeState::Skipped
        )
    }
}

/// One schedulable module plus its per-run state.
#[derive(Debug)]
pub struct RunNode {
    pub module: Arc<Module>,
    pub predecessors: BTreeSet<usize>,
    pub successors: BTreeSet<usize>,
    pub state: NodeState,
    /// Set exactly once, when the node reaches `Failed` or `Skipped`.
    pub outcome: Option<Arc<ModuleError>>,
}

/// The set of nodes scheduled by one run call.
///
/// Assumes the originating module collection already passed
/// [`crate::dag::cycle::check_for_cycles`]; inverting the edges of a DAG
/// yields a DAG again, so no mode can reintroduce a cycle.
#[derive(Debug)]
pub struct RunGraph {
    pub nodes: Vec<RunNode>,
}

impl RunGraph {
    /// Materialize the run graph for `modules` under `mode`.
    ///
    /// Excluded modules are dropped entirely; a dependent of an excluded
    /// module simply loses that predecessor. In `Unordered` mode the
    /// nodes keep their identity (for error attribution) but every edge
    /// is cleared.
    pub fn build(modules: &Modules, mode: TraversalMode) -> Self {
        let surviving: Vec<Arc<Module>> = modules
            .iter()
            .filter(|m| !m.excluded)
            .map(Arc::clone)
            .collect();

        let index: HashMap<&str, usize> = surviving
            .iter()
            .enumerate()
            .map(|(i, m)| (m.path.as_str(), i))
            .collect();

        let mut nodes: Vec<RunNode> = surviving
            .iter()
            .map(|m| RunNode {
                module: Arc::clone(m),
                predecessors: BTreeSet::new(),
                successors: BTreeSet::new(),
                state: NodeState::Waiting,
                outcome: None,
            })
            .collect();

        if mode == TraversalMode::Unordered {
            return Self { nodes };
        }

        for (i, module) in surviving.iter().enumerate() {
            for dep in &module.dependencies {
                let Some(&d) = index.get(dep.as_str()) else {
                    // Dependency excluded or unknown: no edge.
                    continue;
                };

                let (from, to) = match mode {
                    TraversalMode::Reverse => (i, d),
                    _ => (d, i),
                };

                nodes[to].predecessors.insert(from);
                nodes[from].successors.insert(to);
            }
        }

        Self { nodes }
    }

    pub fn all_terminal(&self) -> bool {
        self.nodes.iter().all(|n| n.state.is_terminal())
    }

    /// Whether every predecessor of `idx` has reached a terminal state.
    pub(crate) fn predecessors_terminal(&self, idx: usize) -> bool {
        self.nodes[idx]
            .predecessors
            .iter()
            .all(|&p| self.nodes[p].state.is_terminal())
    }

    /// First predecessor of `idx` that finished with an error, together
    /// with its outcome. Iteration follows node-index order, i.e. the
    /// input order of the module collection, so attribution is stable.
    pub(crate) fn blocking_predecessor(&self, idx: usize) -> Option<(String, Arc<ModuleError>)> {
        for &p in &self.nodes[idx].predecessors {
            let pred = &self.nodes[p];
            if matches!(pred.state, NodeState::Failed | NodeState::Skipped) {
                if let Some(outcome) = &pred.outcome {
                    return Some((pred.module.path.clone(), Arc::clone(outcome)));
                }
            }
        }
        None
    }
}
