//! Bootstrap utilities for the guildkeep binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LOG_ENV_VAR;

/// Env var selecting the log line format (`json` or anything else for text).
pub const LOG_FORMAT_ENV_VAR: &str = "GUILDKEEP_LOG_FORMAT";

/// Initialize tracing with the GUILDKEEP_LOG environment variable.
///
/// Defaults to "info" level if GUILDKEEP_LOG is not set. Logs go to stderr so
/// stdout stays reserved for replies.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
