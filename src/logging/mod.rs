//! Logging infrastructure for portal
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is absent
pub fn default_filter(log_level: &str) -> String {
    format!("portal={},info", log_level)
}

/// Install the global subscriber. Human-readable by default, JSON lines when `json` is set.
pub fn init(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
