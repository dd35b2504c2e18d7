//! Tracing initialization for binaries and integration tests.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, otherwise falls back to `default_directives`
/// (e.g. `"scout_runtime=debug,info"`). Safe to call more than once; later
/// calls are no-ops.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
