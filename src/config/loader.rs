// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawStackFile, StackFile};
use crate::errors::Result;

/// Read a stack file from disk and deserialize it.
///
/// Only TOML deserialization happens here; use [`load_and_validate`] to
/// also get the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawStackFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawStackFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a stack file and run semantic validation.
///
/// Checks that the file declares at least one module, that every `after`
/// reference names a known module (and not the module itself), and that
/// the dependency graph is acyclic.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<StackFile> {
    let raw = load_from_path(path)?;
    let stack = StackFile::try_from(raw)?;
    Ok(stack)
}
