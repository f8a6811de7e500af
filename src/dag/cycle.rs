// src/dag/cycle.rs

//! Cycle detection over a module collection.
//!
//! A straightforward depth-first search with two marks: a closed set of
//! fully explored modules and the current traversal path. Hitting a
//! module that is already on the path is a cycle, and the path slice from
//! that module onward is exactly the chain we report. Dependency lists
//! are walked in declaration order, so the reported chain is
//! deterministic for a given input.

use std::collections::{HashMap, HashSet};

use crate::errors::DependencyCycleError;
use crate::module::{Module, Modules};

pub fn check_for_cycles(modules: &Modules) -> Result<(), DependencyCycleError> {
    let by_path: HashMap<&str, &Module> = modules
        .iter()
        .map(|m| (m.path.as_str(), m.as_ref()))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();

    for module in modules.iter() {
        visit(module, &by_path, &mut visited, &mut path)?;
    }

    Ok(())
}

fn visit<'a>(
    module: &'a Module,
    by_path: &HashMap<&'a str, &'a Module>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Result<(), DependencyCycleError> {
    if let Some(pos) = path.iter().position(|p| *p == module.path.as_str()) {
        let mut chain: Vec<String> = path[pos..].iter().map(|p| p.to_string()).collect();
        chain.push(module.path.clone());
        return Err(DependencyCycleError(chain));
    }

    if visited.contains(module.path.as_str()) {
        return Ok(());
    }

    path.push(&module.path);
    for dep in &module.dependencies {
        // References to modules outside the collection carry no edge.
        if let Some(dep_module) = by_path.get(dep.as_str()) {
            visit(dep_module, by_path, visited, path)?;
        }
    }
    path.pop();

    visited.insert(&module.path);
    Ok(())
}
