// src/exec/hook.rs

//! Pluggable module hook abstraction.
//!
//! The scheduler invokes a [`ModuleHook`] for every module it runs and
//! never looks inside it. Production code uses [`super::CommandHook`],
//! which spawns the module's shell command; tests substitute hooks that
//! record invocations and return canned results.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::options::ModuleOptions;

/// Future returned by a hook invocation.
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// The effectful operation a module performs.
///
/// Contract:
/// - must observe `ctx` and return promptly once it is cancelled
/// - may block on IO and subprocesses
/// - is invoked concurrently for *different* modules, never twice at the
///   same time for the same module
pub trait ModuleHook: Send + Sync {
    fn run<'a>(&'a self, ctx: CancellationToken, opts: &'a ModuleOptions) -> HookFuture<'a>;
}
