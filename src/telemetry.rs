//! Structured logging setup

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(level: &str) -> String {
    format!("tripgenie={level},tower_http=debug")
}

/// Initialize the global tracing subscriber
///
/// Only the first call per process has an effect. `RUST_LOG` takes precedence
/// over `default_level`, which normally comes from `[observability]` in the
/// config file.
///
/// ```no_run
/// tripgenie::telemetry::init("info");
/// tracing::info!("TripGenie starting");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    });
}
