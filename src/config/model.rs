// src/config/model.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::exec::CommandHook;
use crate::module::{Module, Modules};
use crate::options::ModuleOptions;

/// Top-level stack file as read from TOML, before validation.
///
/// ```toml
/// [runner]
/// parallelism = 4
///
/// [module.vpc]
/// path = "infra/vpc"
/// command = "terraform apply -auto-approve"
///
/// [module.app]
/// path = "infra/app"
/// command = "terraform apply -auto-approve"
/// after = ["vpc"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawStackFile {
    /// Global behaviour from `[runner]`.
    #[serde(default)]
    pub runner: RunnerSection,

    /// All modules from `[module.<name>]`, keyed by module name.
    #[serde(default)]
    pub module: BTreeMap<String, ModuleConfig>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunnerSection {
    /// Worker pool size; defaults to the machine's CPU parallelism.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

/// `[module.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// The command to execute for this module.
    pub command: String,

    /// Module directory, relative to the stack file. Defaults to the
    /// module name.
    #[serde(default)]
    pub path: Option<String>,

    /// Names of modules that must finish before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Keep the module out of runs (still drawn by `--dot`).
    #[serde(default)]
    pub excluded: bool,

    /// Treat the module as already applied: never run its command, let
    /// dependents proceed as if it succeeded.
    #[serde(default)]
    pub assume_applied: bool,

    /// Run this module even when one of its dependencies failed.
    #[serde(default)]
    pub ignore_dependency_errors: bool,
}

impl ModuleConfig {
    /// Effective module directory for a given module name.
    pub fn effective_path<'a>(&'a self, name: &'a str) -> &'a str {
        self.path.as_deref().unwrap_or(name)
    }
}

/// A stack file that passed semantic validation (see
/// [`crate::config::validate`]). Construct via `TryFrom<RawStackFile>`.
#[derive(Debug, Clone)]
pub struct StackFile {
    pub runner: RunnerSection,
    pub module: BTreeMap<String, ModuleConfig>,
}

impl StackFile {
    pub(crate) fn new_unchecked(
        runner: RunnerSection,
        module: BTreeMap<String, ModuleConfig>,
    ) -> Self {
        Self { runner, module }
    }

    /// Materialize runnable [`Modules`] wired to the production command
    /// hook. Module identity is the configured path; `after` references
    /// are resolved from names to paths here.
    pub fn to_modules(&self, config_path: &Path) -> Modules {
        let base_dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let modules = self
            .module
            .iter()
            .map(|(name, mc)| {
                let path = mc.effective_path(name);

                let mut options = ModuleOptions::new(base_dir.join(path));
                options.command = mc.command.clone();
                options.ignore_dependency_errors = mc.ignore_dependency_errors;

                let mut module = Module::new(path, options, Arc::new(CommandHook));
                module.excluded = mc.excluded;
                module.assume_applied = mc.assume_applied;
                module.dependencies = mc
                    .after
                    .iter()
                    .filter_map(|dep| {
                        self.module
                            .get(dep)
                            .map(|dep_cfg| dep_cfg.effective_path(dep).to_string())
                    })
                    .collect();
                module
            })
            .collect();

        modules
    }
}
