//! Tracing setup for the pixbatch CLI.
//!
//! Verbosity resolves in order: `RUST_LOG` when set, then the `--verbose`
//! flag, then `logging.level` from the config file. Everything is written
//! to stderr: stdout carries pipeable output (`config show`), and the
//! per-pass progress bars redraw on stderr without tearing log lines.

use pixbatch_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem from config, with CLI overrides.
pub fn init(logging: &LoggingConfig, verbose: bool, json_logs: bool) {
    let level: &str = if verbose { "debug" } else { &logging.level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || logging.format == "json" {
        // JSON format for machine parsing
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans; targets add noise for a two-crate tool
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}
