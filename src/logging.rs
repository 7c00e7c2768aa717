//! Logging initialisation
//!
//! `RUST_LOG` selects the filter (default `info`), e.g.
//! `RUST_LOG=shipping_estimate_rust=debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global fmt subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .init();
}
