//! regen CLI — drives the change-detection cache from the command line.
//!
//! Provides `regen init` for project scaffolding, `regen scan` for running a
//! generation pass over a snapshot file, `regen status` for inspecting the
//! cache, and `regen clean` for discarding it.

#![warn(missing_docs)]

mod clean;
mod init;
mod logging;
mod project;
mod scan;
mod sink;
mod status;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use regen_cache::FirstRunPolicy;

/// Version string recorded in cache manifests.
pub const REGEN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// regen — incremental generation with change detection.
#[derive(Parser, Debug)]
#[command(
    name = "regen",
    version,
    about = "Change-detection cache for incremental code generation"
)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `regen.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new regen project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,
    },
    /// Run one generation pass over the snapshot file.
    Scan(ScanArgs),
    /// Show cached entries.
    Status(StatusArgs),
    /// Remove the cache directory.
    Clean(CleanArgs),
}

/// Arguments for `regen scan`.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Snapshot file to read instead of the configured one.
    #[arg(short, long)]
    pub input: Option<String>,

    /// Only regenerate keys that changed (overrides `emit.mode`).
    #[arg(long)]
    pub changed_only: bool,

    /// How keys seen for the first time are reported (overrides `cache.first_run`).
    #[arg(long, value_enum)]
    pub first_run: Option<CliFirstRun>,
}

/// Arguments for `regen status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `regen clean`.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Also remove generated output files.
    #[arg(long)]
    pub outputs: bool,
}

/// First-run reporting as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliFirstRun {
    /// First-seen keys are reported as changed.
    Changed,
    /// First-seen keys are reported as unchanged.
    Unchanged,
}

impl From<CliFirstRun> for FirstRunPolicy {
    fn from(value: CliFirstRun) -> Self {
        match value {
            CliFirstRun::Changed => FirstRunPolicy::Changed,
            CliFirstRun::Unchanged => FirstRunPolicy::Unchanged,
        }
    }
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { name } => init::run(name, &global),
        Command::Scan(ref args) => scan::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
