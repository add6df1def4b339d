//! Tracing setup shared by the huddle binaries and integration tests.
//!
//! Log context (connection ID, room, username) is propagated via
//! tracing spans and event fields rather than thread-locals, so the
//! async gateway code stays free of mutable logging state.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence when set.
///
/// # Arguments
///
/// * `level` - Default directive when `RUST_LOG` is unset, e.g. `"info"`.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}
