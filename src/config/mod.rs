// src/config/mod.rs

//! Stack file loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ModuleConfig, RawStackFile, RunnerSection, StackFile};
