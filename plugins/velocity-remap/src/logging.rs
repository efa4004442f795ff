//! Log output for the plugin, set up once per process.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `velocity_remap=debug`.
pub const LOG_ENV_VAR: &str = "VELOCITY_REMAP_LOG";

const DEFAULT_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Installs a stderr subscriber for this process.
///
/// A host may load the bundle several times, or already have
/// a global subscriber of its own; either way this is a no-op then.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
