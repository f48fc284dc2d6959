//! Diagnostic logging to stderr.
//!
//! Off unless `TM_MONITOR_LOG` holds a filter directive, so by default the
//! error stream only carries the JSON warning lines.
//! `TM_MONITOR_LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "TM_MONITOR_LOG";
pub const ENV_LOG_FORMAT: &str = "TM_MONITOR_LOG_FORMAT";

/// Install the global subscriber. `log` records from the Azure crate are
/// bridged in as well. Calling twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("off"));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "subscriber already installed");
    }
}
