//! Log initialisation: `log` records go to stderr through a tracing fmt subscriber.

use tracing_subscriber::EnvFilter;

/// Installs the stderr logger. `RUST_LOG` overrides the default `info` filter.
/// Stdout stays free for report output.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A logger may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
