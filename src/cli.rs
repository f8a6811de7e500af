// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stackdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stackdag",
    version,
    about = "Run infrastructure modules in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the stack file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Stack.toml")]
    pub config: String,

    /// Run modules in inverse dependency order (teardown).
    #[arg(long)]
    pub reverse: bool,

    /// Run all modules with no ordering constraints.
    #[arg(long, conflicts_with = "reverse")]
    pub unordered: bool,

    /// Worker pool size. Defaults to [runner].parallelism from the stack
    /// file, falling back to the number of CPUs.
    #[arg(long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Print the dependency graph as DOT and exit without running.
    #[arg(long)]
    pub dot: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STACKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
