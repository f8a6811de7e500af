#![allow(dead_code)]

use std::sync::Arc;

use stackdag::exec::ModuleHook;
use stackdag::module::Module;
use stackdag::options::ModuleOptions;

use crate::hooks::MockHook;

/// Builder for [`Module`] to simplify test setup.
///
/// The default hook is a succeeding [`MockHook`]; pass your own with
/// [`ModuleBuilder::hook`] when the test needs to observe or control it.
pub struct ModuleBuilder {
    path: String,
    after: Vec<String>,
    excluded: bool,
    assume_applied: bool,
    ignore_dependency_errors: bool,
    hook: Option<Arc<dyn ModuleHook>>,
}

impl ModuleBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            after: vec![],
            excluded: false,
            assume_applied: false,
            ignore_dependency_errors: false,
            hook: None,
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.after.push(dep.to_string());
        self
    }

    pub fn excluded(mut self, val: bool) -> Self {
        self.excluded = val;
        self
    }

    pub fn assume_applied(mut self, val: bool) -> Self {
        self.assume_applied = val;
        self
    }

    pub fn ignore_dependency_errors(mut self, val: bool) -> Self {
        self.ignore_dependency_errors = val;
        self
    }

    pub fn hook(mut self, hook: Arc<dyn ModuleHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build(self) -> Module {
        let mut options = ModuleOptions::new(&self.path);
        options.ignore_dependency_errors = self.ignore_dependency_errors;

        let hook = self
            .hook
            .unwrap_or_else(|| Arc::new(MockHook::succeeding(&self.path)));

        let mut module = Module::new(self.path, options, hook);
        module.dependencies = self.after;
        module.excluded = self.excluded;
        module.assume_applied = self.assume_applied;
        module
    }
}
