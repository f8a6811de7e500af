// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod module;
pub mod options;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::errors::Result;
use crate::options::{default_parallelism, RunnerOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - stack file loading + validation
/// - DOT output (`--dot`)
/// - Ctrl-C → run cancellation
/// - the selected run mode
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let stack = load_and_validate(&config_path)?;
    let modules = stack.to_modules(&config_path);

    let mut opts = RunnerOptions::new(config_path);
    opts.default_parallelism = stack
        .runner
        .parallelism
        .unwrap_or_else(default_parallelism);

    if args.dot {
        let stdout = std::io::stdout();
        modules.write_dot(&mut stdout.lock(), &opts)?;
        return Ok(());
    }

    // Ctrl-C → cancel the run token; in-flight commands are killed and
    // not-yet-started modules are skipped.
    let ctx = CancellationToken::new();
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            ctx.cancel();
        });
    }

    let parallelism = args.parallelism.unwrap_or(opts.default_parallelism);
    info!(
        modules = modules.len(),
        parallelism,
        reverse = args.reverse,
        unordered = args.unordered,
        "running stack"
    );

    if args.reverse {
        modules.run_reverse(ctx, &opts, parallelism).await
    } else if args.unordered {
        modules.run_unordered(ctx, &opts, parallelism).await
    } else {
        modules.run(ctx, &opts, parallelism).await
    }
}
