//! Azure Monitor – recent Traffic Manager metrics.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::client::ArmClient;
use crate::types::{
    AzureResult, AzureToken, MetricResponse, ResourceLocator, METRIC_ENDPOINT_STATE,
    METRIC_QPS_BY_ENDPOINT,
};

/// Length of the look-back window, in minutes.
pub const WINDOW_MINUTES: i64 = 5;
/// Aggregation granularity.
pub const INTERVAL: &str = "PT1M";
pub const AGGREGATION: &str = "Average,Maximum";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// ISO 8601 `start/end` interval covering the window that ends at `end`.
pub fn timespan_ending_at(end: DateTime<Utc>) -> String {
    let start = end - Duration::minutes(WINDOW_MINUTES);
    format!(
        "{}/{}",
        start.format(TIMESTAMP_FORMAT),
        end.format(TIMESTAMP_FORMAT)
    )
}

/// Names requested from Azure Monitor, comma separated.
pub fn metric_names() -> String {
    [METRIC_QPS_BY_ENDPOINT, METRIC_ENDPOINT_STATE].join(",")
}

/// Full URL of the resource's metrics sub-resource.
pub fn metrics_url(client: &ArmClient, locator: &ResourceLocator) -> String {
    client.arm_url(&format!(
        "{}/providers/microsoft.insights/metrics",
        locator.resource_id()
    ))
}

/// Query endpoint QPS and probe state for the window ending at `end`.
pub async fn query_endpoint_metrics(
    client: &ArmClient,
    token: &AzureToken,
    locator: &ResourceLocator,
    end: DateTime<Utc>,
) -> AzureResult<MetricResponse> {
    let url = metrics_url(client, locator);
    let timespan = timespan_ending_at(end);
    let names = metric_names();
    let query = [
        ("api-version", client.config().api_version_monitor.as_str()),
        ("timespan", timespan.as_str()),
        ("interval", INTERVAL),
        ("metricnames", names.as_str()),
        ("aggregation", AGGREGATION),
    ];
    debug!("query_endpoint_metrics({}) → {} [{}]", locator, url, timespan);
    client.get_json_with_query(&url, token, &query).await
}

// ─── Tests ──────────────────────────────────────────────────────────
