//! Tracing setup for embedding hosts

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an env-filter, defaulting to debug output for
/// this crate. Call once from the embedding host's entry point.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dateguard_capture=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
