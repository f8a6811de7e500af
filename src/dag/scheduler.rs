// src/dag/scheduler.rs

//! The scheduler: drives a [`RunGraph`] to completion on a bounded pool
//! of workers.
//!
//! A single coordinator loop owns every node's state. Workers are tokio
//! tasks that do exactly one thing: run a module's hook and report back
//! through the `JoinSet`. Admission is bounded by a semaphore whose
//! permits the coordinator acquires *before* dispatch, so at most
//! `parallelism` hooks are ever in flight and a node stays `Ready` (and
//! therefore skippable on cancellation) while the pool is full.
//!
//! Per-node transitions:
//!
//! ```text
//! Waiting ──(deps terminal, no blocking failure)──▶ Ready ──▶ Running ──▶ Succeeded|Failed
//! Waiting ──(blocking dependency failure)──▶ Failed
//! Waiting ──(assume_applied)──▶ Succeeded
//! Waiting|Ready ──(cancelled)──▶ Skipped
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::graph::{NodeState, RunGraph};
use crate::errors::ModuleError;

/// Outcome of one worker: node index plus the hook result.
type WorkerResult = (usize, anyhow::Result<()>);

/// Drive every node of `graph` to a terminal state.
///
/// Returns the per-module errors in completion order; an empty vector
/// means the whole run succeeded. The worker pool lives and dies inside
/// this call: no task it spawns outlives it.
pub async fn run(
    mut graph: RunGraph,
    ctx: CancellationToken,
    parallelism: usize,
) -> Vec<Arc<ModuleError>> {
    let parallelism = parallelism.max(1);
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut workers: JoinSet<WorkerResult> = JoinSet::new();
    let mut worker_nodes: HashMap<task::Id, usize> = HashMap::new();
    let mut errors: Vec<Arc<ModuleError>> = Vec::new();
    let mut cancel_seen = false;

    info!(modules = graph.nodes.len(), parallelism, "scheduler started");

    loop {
        let cancelled = cancel_seen || ctx.is_cancelled();
        settle(&mut graph, cancelled, &mut errors);
        if !cancelled {
            dispatch(&mut graph, &ctx, &semaphore, &mut workers, &mut worker_nodes);
        }

        if graph.all_terminal() {
            break;
        }

        tokio::select! {
            joined = workers.join_next_with_id(), if !workers.is_empty() => {
                match joined {
                    Some(Ok((id, (idx, result)))) => {
                        worker_nodes.remove(&id);
                        complete(&mut graph, idx, result, &mut errors);
                    }
                    Some(Err(join_err)) => {
                        // A panicking hook must not wedge the run: fail
                        // its node and keep going.
                        error!(error = %join_err, "module worker panicked");
                        if let Some(idx) = worker_nodes.remove(&join_err.id()) {
                            complete(
                                &mut graph,
                                idx,
                                Err(anyhow!("module worker panicked: {join_err}")),
                                &mut errors,
                            );
                        }
                    }
                    None => {}
                }
            }
            _ = ctx.cancelled(), if !cancel_seen => {
                info!("cancellation requested; draining in-flight modules");
                cancel_seen = true;
            }
            else => {
                error!("scheduler stalled with non-terminal modules; aborting run loop");
                break;
            }
        }
    }

    // In-flight hooks have all reported by the time every node is
    // terminal, but never return while a worker task is still alive.
    while let Some(joined) = workers.join_next_with_id().await {
        if let Ok((id, (idx, result))) = joined {
            worker_nodes.remove(&id);
            complete(&mut graph, idx, result, &mut errors);
        }
    }

    info!(
        modules = graph.nodes.len(),
        failed = errors.len(),
        "scheduler finished"
    );

    errors
}

/// Apply every state transition that needs no worker, until none fires:
/// skipping on cancellation, dependency-failure propagation (which
/// cascades, hence the fixpoint loop), the assume-applied shortcut, and
/// plain readiness.
fn settle(graph: &mut RunGraph, cancelled: bool, errors: &mut Vec<Arc<ModuleError>>) {
    loop {
        let mut changed = false;

        for idx in 0..graph.nodes.len() {
            let state = graph.nodes[idx].state;

            if cancelled && matches!(state, NodeState::Waiting | NodeState::Ready) {
                let node = &mut graph.nodes[idx];
                let err = Arc::new(ModuleError::Cancelled {
                    module: node.module.path.clone(),
                });
                debug!(module = %node.module.path, "module skipped on cancellation");
                node.outcome = Some(Arc::clone(&err));
                node.state = NodeState::Skipped;
                errors.push(err);
                changed = true;
                continue;
            }

            if state != NodeState::Waiting || !graph.predecessors_terminal(idx) {
                continue;
            }

            let blocking = if graph.nodes[idx].module.options.ignore_dependency_errors {
                None
            } else {
                graph.blocking_predecessor(idx)
            };

            let node = &mut graph.nodes[idx];
            match blocking {
                Some((dependency, underlying)) => {
                    warn!(
                        module = %node.module.path,
                        dependency = %dependency,
                        "module blocked by failed dependency"
                    );
                    let err = Arc::new(ModuleError::Dependency {
                        module: node.module.path.clone(),
                        dependency,
                        underlying,
                    });
                    node.outcome = Some(Arc::clone(&err));
                    node.state = NodeState::Failed;
                    errors.push(err);
                }
                None if node.module.assume_applied => {
                    debug!(
                        module = %node.module.path,
                        "module assumed already applied; hook not invoked"
                    );
                    node.state = NodeState::Succeeded;
                }
                None => {
                    debug!(module = %node.module.path, "module ready");
                    node.state = NodeState::Ready;
                }
            }
            changed = true;
        }

        if !changed {
            break;
        }
    }
}

/// Hand `Ready` nodes to workers while pool slots are free.
fn dispatch(
    graph: &mut RunGraph,
    ctx: &CancellationToken,
    semaphore: &Arc<Semaphore>,
    workers: &mut JoinSet<WorkerResult>,
    worker_nodes: &mut HashMap<task::Id, usize>,
) {
    for idx in 0..graph.nodes.len() {
        if graph.nodes[idx].state != NodeState::Ready {
            continue;
        }

        // Pool full: leave the rest Ready until a completion frees a slot.
        let Ok(permit) = Arc::clone(semaphore).try_acquire_owned() else {
            break;
        };

        let node = &mut graph.nodes[idx];
        node.state = NodeState::Running;

        let module = Arc::clone(&node.module);
        let token = ctx.clone();
        debug!(module = %module.path, "dispatching module to worker");

        let handle = workers.spawn(async move {
            let result = module.hook.run(token, &module.options).await;
            drop(permit);
            (idx, result)
        });
        worker_nodes.insert(handle.id(), idx);
    }
}

/// Record a worker's result on its node.
fn complete(
    graph: &mut RunGraph,
    idx: usize,
    result: anyhow::Result<()>,
    errors: &mut Vec<Arc<ModuleError>>,
) {
    let node = &mut graph.nodes[idx];
    match result {
        Ok(()) => {
            info!(module = %node.module.path, "module finished successfully");
            node.state = NodeState::Succeeded;
        }
        Err(cause) => {
            warn!(module = %node.module.path, error = %cause, "module failed");
            let err = Arc::new(ModuleError::Hook {
                module: node.module.path.clone(),
                cause,
            });
            node.outcome = Some(Arc::clone(&err));
            node.state = NodeState::Failed;
            errors.push(err);
        }
    }
}
