// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers live here:
//! - [`StackdagError`] is the top-level error returned by the library and
//!   CLI entry points (config, IO, validation, run failures).
//! - [`ModuleError`] is the per-module outcome collected by the scheduler
//!   and aggregated into a [`MultiError`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackdagError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Cycle(#[from] DependencyCycleError),

    #[error(transparent)]
    Run(#[from] MultiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StackdagError>;

/// A dependency cycle between modules.
///
/// The chain runs from the first repeated module back to itself, in
/// discovery order: a self-loop on `i` reports `[i, i]`, a two-cycle
/// between `j` and `k` (starting from `j`) reports `[j, k, j]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency cycle between modules: {}", .0.join(" -> "))]
pub struct DependencyCycleError(pub Vec<String>);

/// Terminal outcome of a single module that did not succeed.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// The module's hook ran and returned an error.
    #[error("module '{module}' failed: {cause}")]
    Hook { module: String, cause: anyhow::Error },

    /// The module never ran because one of its dependencies finished with
    /// an error. `underlying` is the dependency's own outcome and may
    /// itself be a `Dependency` error, forming a chain.
    #[error("cannot run module '{module}' because its dependency '{dependency}' failed: {underlying}")]
    Dependency {
        module: String,
        dependency: String,
        underlying: Arc<ModuleError>,
    },

    /// The run was cancelled before the module could start.
    #[error("module '{module}' was skipped because the run was cancelled")]
    Cancelled { module: String },
}

impl ModuleError {
    /// Path of the module this outcome belongs to.
    pub fn module(&self) -> &str {
        match self {
            ModuleError::Hook { module, .. }
            | ModuleError::Dependency { module, .. }
            | ModuleError::Cancelled { module } => module,
        }
    }

    /// For dependency failures, the outcome of the failed dependency.
    pub fn underlying(&self) -> Option<&ModuleError> {
        match self {
            ModuleError::Dependency { underlying, .. } => Some(underlying),
            _ => None,
        }
    }
}

/// Aggregate of per-module errors from one run, in completion order.
///
/// Its `Display` form is the member messages joined by newlines, which is
/// what the CLI prints before exiting non-zero.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<Arc<ModuleError>>,
}

impl MultiError {
    /// Wrap a collection of module errors; `None` when it is empty, so a
    /// clean run stays `Ok`.
    pub fn from_errors(errors: Vec<Arc<ModuleError>>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ModuleError> {
        self.errors.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn multi_error_display_joins_members_with_newlines() {
        let hook = Arc::new(ModuleError::Hook {
            module: "a".to_string(),
            cause: anyhow!("boom"),
        });
        let blocked = Arc::new(ModuleError::Dependency {
            module: "b".to_string(),
            dependency: "a".to_string(),
            underlying: hook.clone(),
        });

        let multi = MultiError::from_errors(vec![hook, blocked]).unwrap();
        let rendered = multi.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "module 'a' failed: boom");
        assert!(lines[1].starts_with("cannot run module 'b'"));
    }

    #[test]
    fn empty_collection_is_no_error() {
        assert!(MultiError::from_errors(Vec::new()).is_none());
    }

    #[test]
    fn cycle_error_formats_chain() {
        let err = DependencyCycleError(vec!["j".into(), "k".into(), "j".into()]);
        assert_eq!(
            err.to_string(),
            "dependency cycle between modules: j -> k -> j"
        );
    }
}
