//! Binary entry point for the manage CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a diff between every consecutive pair of tutorial sources
//! manage compare
//!
//! # Replay the unstaged edit of step 1 onto steps 2 through 4
//! manage patch 1 4
//!
//! # Operate on a directory other than the current one
//! manage --sources tutorial/src compare
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use stepman::catalog::{Catalog, CatalogError};
use stepman::compare::generate_diffs;
use stepman::propagate::{propagate, PropagateError};

// ============================================================================
// CLI Structure
// ============================================================================

/// Manages tutorial sources.
#[derive(Parser, Debug)]
#[command(name = "manage", version, about = "Manages tutorial sources")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Directory containing the numbered tutorial sources (default:
    /// current directory).
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Generate consecutive diffs for tutorial sources.
    Compare,
    /// Apply a change to a sequence of tutorial sources.
    ///
    /// The git patch for the unstaged changes in the starting tutorial
    /// source is applied to the later tutorial sources in the specified
    /// range.
    Patch {
        /// The number of the starting tutorial source.
        start: u32,
        /// The number of the ending tutorial source (inclusive).
        end: u32,
    },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the binary, bridging the per-module errors.
#[derive(Debug, Error)]
enum ManageError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Propagate(#[from] PropagateError),
}

impl ManageError {
    /// Map the error to a process exit code.
    ///
    /// A failed patch application exits with the patch tool's own
    /// status; everything else exits 1.
    fn exit_code(&self) -> u8 {
        match self {
            ManageError::Catalog(_) => 1,
            ManageError::Propagate(err) => err.exit_code(),
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("manage: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), ManageError> {
    let sources = cli.global.sources.unwrap_or_else(|| PathBuf::from("."));

    // Both commands work from the catalog; build it before dispatching.
    let catalog = Catalog::scan(&sources)?;
    tracing::debug!(
        "catalog: {} steps in {}",
        catalog.len(),
        catalog.dir().display()
    );

    match cli.command {
        Command::Compare => {
            let report = generate_diffs(&catalog);
            tracing::info!(
                "compare: {} written, {} skipped, {} failed",
                report.written(),
                report.skipped(),
                report.failed()
            );
            Ok(())
        }
        Command::Patch { start, end } => {
            propagate(&catalog, start, end)?;
            Ok(())
        }
    }
}
