mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use stackdag::errors::{ModuleError, MultiError, StackdagError};
use stackdag::module::Modules;
use stackdag::options::{default_parallelism, RunnerOptions};
use stackdag_test_utils::{ModuleBuilder, MockHook};

fn opts() -> RunnerOptions {
    RunnerOptions::new("/stack.toml")
}

fn unwrap_run_error(result: stackdag::errors::Result<()>) -> MultiError {
    match result {
        Err(StackdagError::Run(multi)) => multi,
        other => panic!("expected a run error, got: {other:?}"),
    }
}

#[tokio::test]
async fn one_module_runs_its_hook() {
    common::init_tracing();

    let hook = Arc::new(MockHook::succeeding("a"));
    let modules = Modules::new(vec![ModuleBuilder::new("a").hook(hook.clone()).build()]);

    let result = modules
        .run_unordered(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(hook.ran());
}

#[tokio::test]
async fn chain_all_runs_even_when_a_dependency_fails() {
    common::init_tracing();

    let hook_a = Arc::new(MockHook::failing("a", "expected error for module a"));
    let hook_b = Arc::new(MockHook::succeeding("b"));
    let hook_c = Arc::new(MockHook::succeeding("c"));
    let modules = Modules::new(vec![
        ModuleBuilder::new("a").hook(hook_a.clone()).build(),
        ModuleBuilder::new("b")
            .after("a")
            .hook(hook_b.clone())
            .build(),
        ModuleBuilder::new("c")
            .after("b")
            .hook(hook_c.clone())
            .build(),
    ]);

    let result = modules
        .run_unordered(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    // No ordering means no dependency-failure propagation: the composite
    // carries only a's own error.
    let multi = unwrap_run_error(result);
    assert_eq!(multi.len(), 1);
    assert!(matches!(
        multi.errors().next().unwrap(),
        ModuleError::Hook { module, .. } if module == "a"
    ));

    assert!(hook_a.ran());
    assert!(hook_b.ran());
    assert!(hook_c.ran());
}

#[tokio::test]
async fn assume_applied_module_never_runs_unordered_either() {
    common::init_tracing();

    let hook_a = Arc::new(MockHook::succeeding("a"));
    let hook_b = Arc::new(MockHook::succeeding("b"));
    let modules = Modules::new(vec![
        ModuleBuilder::new("a")
            .assume_applied(true)
            .hook(hook_a.clone())
            .build(),
        ModuleBuilder::new("b")
            .after("a")
            .hook(hook_b.clone())
            .build(),
    ]);

    let result = modules
        .run_unordered(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(!hook_a.ran());
    assert!(hook_b.ran());
}
