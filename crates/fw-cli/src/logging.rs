//! Tracing setup for the fwreport binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the subscriber once, scoping the verbosity flag to this
/// workspace's crates. `RUST_LOG` overrides the flag entirely.
pub fn init(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("fw_core={level},fw_lookup={level},fw_cli={level}"))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}
