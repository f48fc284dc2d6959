//! Health verdict for the profile.
//!
//! The platform's own availability state always wins. Without it the verdict
//! is derived from the profile configuration and the probe states, in this
//! order: disabled profile, probe states, endpoint configuration, profile
//! status.

use std::fmt;

use serde::Serialize;
use tmmon_azure::types::AvailabilityStatus;

use crate::metrics::MetricSnapshot;
use crate::normalize::ProfileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Available,
    Unavailable,
    Degraded,
    Disabled,
    Unknown,
    #[serde(rename = "No active endpoints")]
    NoActiveEndpoints,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Unavailable => write!(f, "Unavailable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Unknown => write!(f, "Unknown"),
            Self::NoActiveEndpoints => write!(f, "No active endpoints"),
        }
    }
}

/// Map the Resource Health availability state onto our labels.
/// Missing or unrecognised states fold to `Unknown`.
pub fn platform_label(status: &AvailabilityStatus) -> HealthStatus {
    match status.properties.availability_state.as_deref() {
        Some("Available") => HealthStatus::Available,
        Some("Unavailable") => HealthStatus::Unavailable,
        Some("Degraded") => HealthStatus::Degraded,
        _ => HealthStatus::Unknown,
    }
}

/// Resolve the overall health label. Pure and total.
pub fn resolve(
    platform: Option<&AvailabilityStatus>,
    profile: Option<&ProfileRecord>,
    metrics: &MetricSnapshot,
) -> HealthStatus {
    match platform {
        Some(status) => platform_label(status),
        None => derive(profile, metrics),
    }
}

fn derive(profile: Option<&ProfileRecord>, metrics: &MetricSnapshot) -> HealthStatus {
    let Some(profile) = profile else {
        return HealthStatus::Unknown;
    };

    if profile.is_disabled() {
        return HealthStatus::Disabled;
    }

    if !metrics.endpoint_states.is_empty() {
        return ratio(metrics.online_count(), metrics.endpoint_states.len());
    }

    if !profile.endpoints.is_empty() {
        let enabled = profile.endpoints.iter().filter(|ep| ep.is_enabled()).count();
        let active = profile.endpoints.iter().filter(|ep| ep.is_active()).count();
        if active == 0 {
            return HealthStatus::NoActiveEndpoints;
        }
        return ratio(enabled, active);
    }

    if profile.is_enabled() {
        HealthStatus::Available
    } else {
        HealthStatus::Unknown
    }
}

/// `good` out of a non-zero `total`.
fn ratio(good: usize, total: usize) -> HealthStatus {
    if good == 0 {
        HealthStatus::Unavailable
    } else if good < total {
        HealthStatus::Degraded
    } else {
        HealthStatus::Available
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
