//! Logging utilities for the Appointly application.
//!
//! This module provides a standardized approach to logging across all crates
//! in the workspace. Every crate logs through `tracing`; the binary calls
//! [`init`] once at startup.

use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default level (INFO).
///
/// # Examples
///
/// ```
/// use appointly_common::logging;
///
/// logging::init();
/// // A second call is a no-op.
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` is honoured; the `appointly` directive is added on top of it so
/// the workspace crates always log at `level` or finer.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("appointly={}", level)
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    // try_init: a global default subscriber may already be set (tests, double init)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
