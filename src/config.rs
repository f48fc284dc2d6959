//! Runtime settings: endpoints, API versions and timeouts.
//!
//! Defaults target the real Azure endpoints. Environment overrides exist so
//! the monitor can be pointed at a proxy or a local stand-in.

use std::time::Duration;

use tmmon_azure::types::AzureConfig;
use tracing::warn;

pub const ENV_ARM_BASE: &str = "TM_MONITOR_ARM_BASE";
pub const ENV_METADATA_URL: &str = "TM_MONITOR_METADATA_URL";
pub const ENV_TOKEN_TIMEOUT_SECS: &str = "TM_MONITOR_TOKEN_TIMEOUT_SECS";
pub const ENV_QUERY_TIMEOUT_SECS: &str = "TM_MONITOR_QUERY_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSettings {
    pub azure: AzureConfig,
}

impl MonitorSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in
    /// production). Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut azure = AzureConfig::new();

        if let Some(base) = get(ENV_ARM_BASE) {
            azure.arm_base = base;
        }
        if let Some(url) = get(ENV_METADATA_URL) {
            azure.metadata_token_url = url;
        }
        if let Some(timeout) =
            get(ENV_TOKEN_TIMEOUT_SECS).and_then(|v| parse_secs(ENV_TOKEN_TIMEOUT_SECS, &v))
        {
            azure.token_timeout = timeout;
        }
        if let Some(timeout) =
            get(ENV_QUERY_TIMEOUT_SECS).and_then(|v| parse_secs(ENV_QUERY_TIMEOUT_SECS, &v))
        {
            azure.query_timeout = timeout;
        }

        Self { azure }
    }
}

/// Positive seconds that fit a [`Duration`]; fractional values allowed.
fn parse_secs(key: &str, raw: &str) -> Option<Duration> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
    match parsed {
        Some(timeout) => Some(timeout),
        None => {
            warn!(%key, value = %raw, "ignoring invalid timeout override");
            None
        }
    }
}
