//! Logging setup for entity-loaders.
//!
//! Loaders emit `tracing` events: `debug` when an operation is skipped for a
//! non-persisted entity, `trace` when it is delegated to the context, `warn`
//! when a best-effort collection operation swallows a member failure. This
//! module installs a subscriber for them when asked to.
//!
//! # Environment Variables
//!
//! - `ENTITY_LOADERS_DEBUG=true` - Enable debug logging
//! - `ENTITY_LOADERS_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `ENTITY_LOADERS_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use entity_loaders_core::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

/// Enables debug logging when truthy.
pub const DEBUG_ENV: &str = "ENTITY_LOADERS_DEBUG";

/// Overrides the log level.
pub const LOG_LEVEL_ENV: &str = "ENTITY_LOADERS_LOG_LEVEL";

/// Selects the output format.
pub const LOG_FORMAT_ENV: &str = "ENTITY_LOADERS_LOG_FORMAT";

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `ENTITY_LOADERS_DEBUG`.
///
/// Returns `true` if it is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

/// Get the configured log level from `ENTITY_LOADERS_LOG_LEVEL`.
///
/// Defaults to "debug" if debug logging is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    resolve_level(env::var(LOG_LEVEL_ENV).ok().as_deref(), is_debug_enabled())
}

/// Get the configured log format from `ENTITY_LOADERS_LOG_FORMAT`.
///
/// Defaults to "json" for structured logging.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var(LOG_FORMAT_ENV).ok().as_deref())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match requested.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Initialize the logging system.
///
/// Subsequent calls are no-ops. Nothing is installed unless debug logging or
/// an explicit level is requested, and nothing at all without the
/// `tracing-subscriber` feature; applications with their own subscriber can
/// skip this entirely.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LOG_LEVEL_ENV).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "entity_loaders={},entity_loaders_core={},entity_loaders_memory={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let installed = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "entity-loaders logging initialized"
                );
            }
        }
    });
}

/// Initialize logging with a specific level.
///
/// # Safety
///
/// This function modifies environment variables, which is unsafe in
/// multi-threaded programs. Call this early in your program before
/// spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as a startup-only call
    unsafe {
        env::set_var(LOG_LEVEL_ENV, level);
    }
    init();
}
