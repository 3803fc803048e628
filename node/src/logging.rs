//! Structured logging initialisation for hosts embedding the core.
//!
//! The core is a library, so installation is idempotent: several
//! components (or several tests in one process) may race to initialise
//! and only the first wins. `RUST_LOG` overrides the caller-supplied
//! filter (e.g. `"info"`, `"debug,agora_node=trace"`) when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty-printed, coloured output for local development.
    Human,
    /// Newline-delimited JSON for production and log aggregation pipelines.
    Json,
}

/// Install the global tracing subscriber if none is set yet.
///
/// Returns `true` when this call installed it, `false` when another
/// subscriber was already in place (the filter and format of the earlier
/// winner stay in effect).
pub fn init_logging(format: LogFormat, filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Human => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
    };
    installed.is_ok()
}
