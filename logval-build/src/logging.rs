//! Structured logging for the logval tools.
//!
//! Library code only emits `tracing` events; binaries call
//! [`init_structured_logging`] once to get JSON lines on stderr, keeping
//! stdout for reports.

/// Installs the global JSON subscriber.
///
/// `RUST_LOG` controls filtering (e.g. `RUST_LOG=logval_build=debug`).
/// Does nothing if a subscriber is already installed.
pub fn init_structured_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
