//! Tracing subscriber setup for the `regen` binary.
//!
//! `RUST_LOG` wins when set. Otherwise the level comes from `--quiet` /
//! `--verbose`. `REGEN_LOG_FORMAT=json` switches to JSON lines for log
//! aggregation; anything else gets the compact human format. Logs always go
//! to stderr.

use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line human output.
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Reads the format from `REGEN_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("REGEN_LOG_FORMAT").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Returns the default filter directive for the given verbosity flags.
pub fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Does nothing if one is already set.
pub fn init(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));

    let result = match LogFormat::from_env() {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
