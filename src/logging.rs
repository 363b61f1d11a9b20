//! Logging setup.
//!
//! Logs go to stderr so table and JSON output on stdout stays clean. `RUST_LOG`
//! takes precedence; otherwise `--verbose` selects `debug` and the default is `warn`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let fallback = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        let subscriber = fmt()
            .with_env_filter(filter)
            .with_target(verbose)
            .with_writer(std::io::stderr)
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
    });
}
