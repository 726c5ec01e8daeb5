//! Telemetry and observability
//!
//! Sets up `tracing-subscriber` once, before the config file is read, and
//! hands back a reload handle so the level can be raised to the
//! config-driven (or `--log`) value after the config loads. `RUST_LOG`
//! always wins over both.
//!
//! Debug builds log pretty-printed terminal output; release builds log
//! JSON with span context.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

/// Handle for adjusting the log level after initialization
pub type LevelHandle = reload::Handle<EnvFilter, Registry>;

/// Filter directives for a level: applied globally and to this crate.
fn directives(level: &str) -> String {
    format!("{level},shield_engine={level}")
}

fn env_or(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)))
}

/// Initialize the tracing subscriber at the default level.
///
/// Called before the config file is read so config-loading errors are
/// logged too. Returns the handle `set_log_level` needs.
pub fn init_telemetry() -> LevelHandle {
    let (filter, handle) = reload::Layer::new(env_or(DEFAULT_LEVEL));

    #[cfg(debug_assertions)]
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().pretty().with_target(false))
        .try_init()
        .ok();

    #[cfg(not(debug_assertions))]
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .ok();

    handle
}

/// Swap in the resolved log level once the config is available.
///
/// A set `RUST_LOG` keeps precedence: the reload is skipped so the
/// operator's filter survives config loading.
pub fn set_log_level(handle: &LevelHandle, level: &str) {
    if std::env::var("RUST_LOG").is_ok() {
        return;
    }
    handle.reload(EnvFilter::new(directives(level))).ok();
}
