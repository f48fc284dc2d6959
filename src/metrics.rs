//! Reduction of Azure Monitor time series to one latest value per metric.

use std::collections::BTreeMap;

use serde::Serialize;
use tmmon_azure::types::{
    Metric, MetricResponse, TimeSeries, ENDPOINT_STATE_TAG, METRIC_ENDPOINT_STATE,
};

/// Probe verdict for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointState {
    Online,
    Degraded,
    Offline,
}

impl EndpointState {
    /// `1` is online, `0.5` degraded, any other value offline.
    pub fn from_probe_value(value: f64) -> Self {
        if value == 1.0 {
            Self::Online
        } else if value == 0.5 {
            Self::Degraded
        } else {
            Self::Offline
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStateEntry {
    /// Short endpoint name (last segment of the endpoint resource ID).
    pub endpoint: String,
    pub state: EndpointState,
}

/// Latest value per metric name, plus the per-endpoint probe states
/// under the reserved key `endpointStates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoint_states: Vec<EndpointStateEntry>,
}

impl MetricSnapshot {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.endpoint_states.is_empty()
    }

    /// Number of endpoints the probes report as online.
    pub fn online_count(&self) -> usize {
        self.endpoint_states
            .iter()
            .filter(|e| e.state == EndpointState::Online)
            .count()
    }
}

/// Collapse each metric's time series to its latest valued point.
pub fn reduce(response: &MetricResponse) -> MetricSnapshot {
    let mut snapshot = MetricSnapshot::default();

    for metric in &response.value {
        let Some(name) = metric.name() else {
            continue;
        };
        if metric.timeseries.is_empty() {
            continue;
        }

        if name == METRIC_ENDPOINT_STATE {
            let states = endpoint_states(metric);
            if !states.is_empty() {
                snapshot.endpoint_states = states;
            }
        } else if let Some(value) = metric.timeseries.first().and_then(latest_value) {
            snapshot.values.insert(name.to_string(), value);
        }
    }

    snapshot
}

/// Most recent point's average, falling back to its maximum.
fn latest_value(series: &TimeSeries) -> Option<f64> {
    series
        .data
        .iter()
        .rev()
        .find_map(|point| point.average.or(point.maximum))
}

fn endpoint_states(metric: &Metric) -> Vec<EndpointStateEntry> {
    metric
        .timeseries
        .iter()
        .filter_map(|series| {
            let endpoint = series
                .metadata(ENDPOINT_STATE_TAG)
                .filter(|id| !id.is_empty())
                .and_then(|id| id.rsplit('/').next())?;
            let value = latest_value(series)?;
            Some(EndpointStateEntry {
                endpoint: endpoint.to_string(),
                state: EndpointState::from_probe_value(value),
            })
        })
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────
