//! Tracing subscriber setup.
//!
//! Log lines go to stderr so stdout stays clean for command output.
//! `RUST_LOG`, when set, takes precedence over `[log].filter`, which
//! [`Config::validate`](crate::config::Config::validate) has already checked.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

const FALLBACK_FILTER: &str = "pricewatch=info";

pub fn init(config: &LogConfig) {
    let from_env = EnvFilter::try_from_default_env();
    let rejected_env = match &from_env {
        Err(e) if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() => Some(e.to_string()),
        _ => None,
    };

    let filter = from_env
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Some(error) = rejected_env {
        tracing::warn!(%error, "ignoring invalid {}, using log.filter", EnvFilter::DEFAULT_ENV);
    }
}
