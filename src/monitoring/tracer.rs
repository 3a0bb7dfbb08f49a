/*!
 * Structured Tracing
 * tracing-subscriber setup for the synchronization events this crate emits
 *
 * Features:
 * - EnvFilter driven verbosity (RUST_LOG)
 * - JSON-formatted logs for structured parsing
 * - Thread ids on every event, since every event here is about threads
 */

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable switching output to JSON
pub const TRACE_JSON_ENV: &str = "SYNC_TRACE_JSON";

fn json_requested() -> bool {
    std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// # Panics
///
/// If a global subscriber is already installed; use [`try_init_tracing`]
/// where that can happen.
pub fn init_tracing() {
    if !try_init_tracing() {
        panic!("a global tracing subscriber is already installed");
    }
}

/// Like [`init_tracing`], returning `false` if a subscriber already exists
pub fn try_init_tracing() -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json_requested() {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true),
            )
            .try_init()
            .is_ok()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = json_requested(), "Structured tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_second_init_is_refused() {
        try_init_tracing();
        assert!(!try_init_tracing());
    }

    #[test]
    #[serial]
    fn test_json_flag_parsing() {
        std::env::set_var(TRACE_JSON_ENV, "true");
        assert!(json_requested());
        std::env::set_var(TRACE_JSON_ENV, "0");
        assert!(!json_requested());
        std::env::remove_var(TRACE_JSON_ENV);
        assert!(!json_requested());
    }
}
