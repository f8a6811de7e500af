// src/module.rs

//! Module descriptors and the collection type carrying the public API.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dag::{cycle, dot, scheduler, RunGraph, TraversalMode};
use crate::errors::{DependencyCycleError, MultiError, Result};
use crate::exec::ModuleHook;
use crate::options::{ModuleOptions, RunnerOptions};

/// A single unit of infrastructure work.
///
/// Immutable once constructed. `path` doubles as the module's identity
/// and its display label; `dependencies` lists the paths of modules that
/// must reach a terminal state first (declaration order is preserved,
/// duplicates are tolerated).
pub struct Module {
    pub path: String,

    /// Paths of this module's dependencies.
    pub dependencies: Vec<String>,

    /// Excluded modules are pruned from the run graph but still rendered
    /// (highlighted) by the visualizer.
    pub excluded: bool,

    /// Treated as already successful: the hook is never invoked, in any
    /// traversal mode, and successors proceed as if it had run.
    pub assume_applied: bool,

    pub options: ModuleOptions,

    pub hook: Arc<dyn ModuleHook>,
}

impl Module {
    pub fn new(
        path: impl Into<String>,
        options: ModuleOptions,
        hook: Arc<dyn ModuleHook>,
    ) -> Self {
        Self {
            path: path.into(),
            dependencies: Vec::new(),
            excluded: false,
            assume_applied: false,
            options,
            hook,
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .field("excluded", &self.excluded)
            .field("assume_applied", &self.assume_applied)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An ordered collection of modules.
///
/// This is the entry point for everything the runner does: cycle
/// validation, the three run modes, and DOT visualization.
#[derive(Debug, Default)]
pub struct Modules {
    modules: Vec<Arc<Module>>,
}

impl Modules {
    pub fn new(modules: Vec<Module>) -> Self {
        Self {
            modules: modules.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Check the dependency relation for cycles.
    ///
    /// Returns the offending chain on failure; see
    /// [`DependencyCycleError`] for its shape.
    pub fn check_for_cycles(&self) -> std::result::Result<(), DependencyCycleError> {
        cycle::check_for_cycles(self)
    }

    /// Run every module in dependency order: a module starts only after
    /// all of its dependencies reached a terminal state.
    pub async fn run(
        &self,
        ctx: CancellationToken,
        opts: &RunnerOptions,
        parallelism: usize,
    ) -> Result<()> {
        self.run_with_mode(TraversalMode::Normal, ctx, opts, parallelism)
            .await
    }

    /// Run every module in inverse dependency order: dependents first,
    /// dependencies last (the order used to tear a stack down).
    pub async fn run_reverse(
        &self,
        ctx: CancellationToken,
        opts: &RunnerOptions,
        parallelism: usize,
    ) -> Result<()> {
        self.run_with_mode(TraversalMode::Reverse, ctx, opts, parallelism)
            .await
    }

    /// Run every module with no ordering constraints at all; every module
    /// is immediately eligible and failures never block anything.
    pub async fn run_unordered(
        &self,
        ctx: CancellationToken,
        opts: &RunnerOptions,
        parallelism: usize,
    ) -> Result<()> {
        self.run_with_mode(TraversalMode::Unordered, ctx, opts, parallelism)
            .await
    }

    /// Write the dependency graph as a DOT digraph.
    ///
    /// Module labels have the directory of `opts.config_path` trimmed;
    /// excluded modules are highlighted in red.
    pub fn write_dot<W: io::Write>(&self, writer: &mut W, opts: &RunnerOptions) -> Result<()> {
        dot::write_dot(writer, self, opts)?;
        Ok(())
    }

    async fn run_with_mode(
        &self,
        mode: TraversalMode,
        ctx: CancellationToken,
        opts: &RunnerOptions,
        parallelism: usize,
    ) -> Result<()> {
        self.check_for_cycles()?;

        // `parallelism = 0` means "use the configured default".
        let parallelism = if parallelism == 0 {
            opts.default_parallelism
        } else {
            parallelism
        };

        info!(modules = self.len(), ?mode, parallelism, "starting run");

        let graph = RunGraph::build(self, mode);
        let errors = scheduler::run(graph, ctx, parallelism).await;

        match MultiError::from_errors(errors) {
            Some(multi) => Err(multi.into()),
            None => Ok(()),
        }
    }
}

impl From<Vec<Module>> for Modules {
    fn from(modules: Vec<Module>) -> Self {
        Self::new(modules)
    }
}

impl FromIterator<Module> for Modules {
    fn from_iter<T: IntoIterator<Item = Module>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
