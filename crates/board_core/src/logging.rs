//! Process-wide diagnostic output.
//!
//! Events go to stderr so that stdout stays reserved for command output.
//! `BOARD_LOG` takes precedence over the configured level and accepts any
//! `EnvFilter` directive, e.g. `board_core=debug`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "BOARD_LOG";
pub const DEFAULT_LEVEL: &str = "warn";

/// Installs the global subscriber. Returns `false` when one was already
/// installed; never panics.
pub fn init_logging(level: Option<&str>) -> bool {
    let filter = build_filter(std::env::var(LOG_ENV_VAR).ok().as_deref(), level);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn build_filter(env_directive: Option<&str>, level: Option<&str>) -> EnvFilter {
    let from_env = env_directive
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok());
    if let Some(filter) = from_env {
        return filter;
    }

    level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}
