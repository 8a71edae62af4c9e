//! Logging setup
//!
//! Use the `RUST_LOG` env var to control the log level,
//! e.g. `RUST_LOG=debug` or `RUST_LOG=chatroom=trace`.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Logs go to stderr so that a client can keep stdout for chat lines.
pub fn init(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
