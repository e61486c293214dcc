use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    init_logging_with_default("info");
}

/// Installs the fmt subscriber, falling back to `default_directive` when
/// `RUST_LOG` is unset or invalid. Safe to call more than once.
pub fn init_logging_with_default(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
