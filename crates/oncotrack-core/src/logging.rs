//! Log output for host shells.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive when neither `RUST_LOG` nor a filter is given.
pub const DEFAULT_FILTER: &str = "oncotrack_core=info,oncotrack_insight=info";

/// Install a formatted subscriber. `RUST_LOG` takes precedence over `filter`.
///
/// Returns false if a global subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
