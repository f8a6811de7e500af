// src/dag/dot.rs

//! DOT rendering of the module dependency graph.
//!
//! Output is deterministic: modules in input order, each node line
//! followed by that module's edges in declaration order. Excluded
//! modules stay visible (they are pruned from runs, not from the
//! picture) and are highlighted in red.

use std::io::{self, Write};

use crate::module::Modules;
use crate::options::RunnerOptions;

pub fn write_dot<W: Write>(
    writer: &mut W,
    modules: &Modules,
    opts: &RunnerOptions,
) -> io::Result<()> {
    // Labels drop the stack file's directory, so `/config/alpha/e` under
    // `/config/stack.toml` renders as `alpha/e`. Paths outside that
    // directory render verbatim.
    let prefix = opts
        .config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| format!("{}/", p.display()));

    writeln!(writer, "digraph {{")?;

    for module in modules.iter() {
        let label = trim_label(&module.path, prefix.as_deref());

        if module.excluded {
            writeln!(writer, "\t\"{label}\" [color=red];")?;
        } else {
            writeln!(writer, "\t\"{label}\" ;")?;
        }

        for dep in &module.dependencies {
            writeln!(
                writer,
                "\t\"{label}\" -> \"{}\";",
                trim_label(dep, prefix.as_deref())
            )?;
        }
    }

    writeln!(writer, "}}")?;
    Ok(())
}

fn trim_label<'a>(path: &'a str, prefix: Option<&str>) -> &'a str {
    match prefix {
        Some(prefix) => path.strip_prefix(prefix).unwrap_or(path),
        None => path,
    }
}
