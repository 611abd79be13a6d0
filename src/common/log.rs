//! Subscriber setup for the developer binary.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to whoever embeds the navigator.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

pub const LOG_ENV_VAR: &str = "TASKNAV_LOG";

/// Installs a hierarchical stderr logger filtered by `TASKNAV_LOG`.
///
/// `default_level` applies when the variable is unset or unparsable.
pub fn init_logging(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let tree = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_amount(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    if tracing_subscriber::registry().with(filter).with(tree).try_init().is_err() {
        tracing::debug!("a global subscriber was already installed");
    }
}
