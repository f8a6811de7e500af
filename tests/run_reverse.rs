mod common;

use std::sync::{Arc, Mutex};

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
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(hook.ran());
}

#[tokio::test]
async fn independent_modules_all_run() {
    common::init_tracing();

    let hooks: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| Arc::new(MockHook::succeeding(name)))
        .collect();
    let modules: Modules = ["a", "b", "c"]
        .iter()
        .zip(&hooks)
        .map(|(name, hook)| ModuleBuilder::new(name).hook(hook.clone()).build())
        .collect();

    let result = modules
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(hooks.iter().all(|h| h.ran()));
}

#[tokio::test]
async fn chain_runs_dependents_before_dependencies() {
    common::init_tracing();

    let started = Arc::new(Mutex::new(Vec::new()));
    let modules = Modules::new(vec![
        ModuleBuilder::new("a")
            .hook(Arc::new(
                MockHook::succeeding("a").with_start_log(started.clone()),
            ))
            .build(),
        ModuleBuilder::new("b")
            .after("a")
            .hook(Arc::new(
                MockHook::succeeding("b").with_start_log(started.clone()),
            ))
            .build(),
        ModuleBuilder::new("c")
            .after("b")
            .hook(Arc::new(
                MockHook::succeeding("c").with_start_log(started.clone()),
            ))
            .build(),
    ]);

    let result = modules
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert_eq!(*started.lock().unwrap(), ["c", "b", "a"]);
}

#[tokio::test]
async fn failure_blocks_former_dependencies_with_chained_errors() {
    common::init_tracing();

    let hook_a = Arc::new(MockHook::succeeding("a"));
    let hook_b = Arc::new(MockHook::succeeding("b"));
    let hook_c = Arc::new(MockHook::failing("c", "expected error for module c"));
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
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    let multi = unwrap_run_error(result);
    assert_eq!(multi.len(), 3);

    // c ran (it is the root in reverse order); b and a were blocked.
    assert!(!hook_a.ran());
    assert!(!hook_b.ran());
    assert!(hook_c.ran());

    let b_err = multi
        .errors()
        .find(|e| e.module() == "b")
        .expect("no error for b");
    assert!(matches!(
        b_err,
        ModuleError::Dependency { dependency, .. } if dependency == "c"
    ));

    let a_err = multi
        .errors()
        .find(|e| e.module() == "a")
        .expect("no error for a");
    let ModuleError::Dependency {
        dependency,
        underlying,
        ..
    } = a_err
    else {
        panic!("a's error is not a dependency error")
    };
    assert_eq!(dependency, "b");
    assert!(matches!(
        underlying.as_ref(),
        ModuleError::Dependency { module, dependency, .. }
            if module == "b" && dependency == "c"
    ));
}

#[tokio::test]
async fn larger_graph_spares_former_dependents_of_the_failure() {
    common::init_tracing();

    let hook_a = Arc::new(MockHook::succeeding("a"));
    let hook_b = Arc::new(MockHook::succeeding("b"));
    let hook_c = Arc::new(MockHook::failing("c", "expected error for module c"));
    let hook_d = Arc::new(MockHook::succeeding("d"));
    let hook_e = Arc::new(MockHook::succeeding("e"));
    let hook_f = Arc::new(MockHook::succeeding("f"));

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
        ModuleBuilder::new("d")
            .after("a")
            .after("b")
            .after("c")
            .hook(hook_d.clone())
            .build(),
        ModuleBuilder::new("e").hook(hook_e.clone()).build(),
        ModuleBuilder::new("f")
            .after("e")
            .after("d")
            .hook(hook_f.clone())
            .build(),
    ]);

    let result = modules
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    let multi = unwrap_run_error(result);
    assert_eq!(multi.len(), 3);

    // In reverse order d and f precede c, so they run; a and b trail c
    // and are blocked by its failure.
    assert!(!hook_a.ran());
    assert!(!hook_b.ran());
    assert!(hook_c.ran());
    assert!(hook_d.ran());
    assert!(hook_e.ran());
    assert!(hook_f.ran());
}

#[tokio::test]
async fn assume_applied_module_never_runs_in_reverse_either() {
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
        .run_reverse(CancellationToken::new(), &opts(), default_parallelism())
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(!hook_a.ran());
    assert!(hook_b.ran());
}
