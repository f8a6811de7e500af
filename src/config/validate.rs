// src/config/validate.rs

//! Semantic validation of a raw stack file.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{RawStackFile, StackFile};
use crate::errors::{Result, StackdagError};

impl TryFrom<RawStackFile> for StackFile {
    type Error = StackdagError;

    fn try_from(raw: RawStackFile) -> std::result::Result<Self, Self::Error> {
        validate_raw(&raw)?;
        Ok(StackFile::new_unchecked(raw.runner, raw.module))
    }
}

fn validate_raw(raw: &RawStackFile) -> Result<()> {
    if raw.module.is_empty() {
        return Err(StackdagError::Config(
            "stack file must contain at least one [module.<name>] section".to_string(),
        ));
    }

    if let Some(0) = raw.runner.parallelism {
        return Err(StackdagError::Config(
            "[runner].parallelism must be >= 1".to_string(),
        ));
    }

    for (name, module) in raw.module.iter() {
        if module.command.trim().is_empty() {
            return Err(StackdagError::Config(format!(
                "module '{name}' has an empty `command`"
            )));
        }

        for dep in module.after.iter() {
            if !raw.module.contains_key(dep) {
                return Err(StackdagError::Config(format!(
                    "module '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            if dep == name {
                return Err(StackdagError::Config(format!(
                    "module '{name}' cannot depend on itself in `after`"
                )));
            }
        }
    }

    validate_acyclic(raw)
}

/// Reject cyclic stack files up front. Edge direction is dep -> module,
/// so a topological sort succeeds exactly when the file is runnable.
fn validate_acyclic(raw: &RawStackFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in raw.module.keys() {
        graph.add_node(name.as_str());
    }
    for (name, module) in raw.module.iter() {
        for dep in module.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(StackdagError::Config(format!(
            "dependency cycle in stack file involving module '{}'",
            cycle.node_id()
        ))),
    }
}
