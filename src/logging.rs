// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins; otherwise info for everything.
pub fn init_tracing() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
}
