//! Tracing setup for the `retail` binary.
//!
//! Logs go to stderr so stdout carries only the report (tables, plots), which
//! keeps `retail ... > report.txt` usable. Verbosity follows `RUST_LOG` and
//! defaults to `info`.

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::error::AppError;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Calling it twice is an error.
pub fn init() -> Result<(), AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let subscriber = Registry::default().with(env_filter).with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::new(2, format!("Failed to install tracing subscriber: {e}")))?;
    Ok(())
}
