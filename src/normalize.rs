//! Stable, documented projection of the raw Traffic Manager profile.
//!
//! Normalizing never fails: whatever the service omitted comes out as
//! `null` (or an empty endpoint list).

use serde::Serialize;
use serde_json::Value;
use tmmon_azure::types::{
    DnsConfig, EnabledState, MonitorConfig, ProfileEndpoint, TrafficManagerProfile,
};

/// Normalized profile, serialized field-for-field into the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_status: Option<EnabledState>,
    pub traffic_routing_method: Option<String>,
    pub dns_config: DnsConfig,
    pub monitor_config: MonitorConfig,
    pub endpoints: Vec<EndpointRecord>,
    pub traffic_view_enrollment_status: Option<String>,
    pub max_return: Option<i64>,
    pub allowed_endpoint_record_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub endpoint_type: Option<String>,
    pub target: Option<String>,
    pub endpoint_status: Option<EnabledState>,
    pub endpoint_monitor_status: Option<String>,
    pub priority: Option<i64>,
    pub weight: Option<i64>,
    pub endpoint_location: Option<String>,
    pub min_child_endpoints: Option<i64>,
    pub geo_mapping: Option<Value>,
    pub subnets: Option<Value>,
    pub custom_headers: Option<Value>,
}

impl ProfileRecord {
    pub fn is_enabled(&self) -> bool {
        self.profile_status == Some(EnabledState::Enabled)
    }

    pub fn is_disabled(&self) -> bool {
        self.profile_status == Some(EnabledState::Disabled)
    }
}

impl EndpointRecord {
    pub fn is_enabled(&self) -> bool {
        self.endpoint_status == Some(EnabledState::Enabled)
    }

    /// Anything not explicitly `Disabled` counts, including a missing status.
    pub fn is_active(&self) -> bool {
        self.endpoint_status != Some(EnabledState::Disabled)
    }
}

impl From<ProfileEndpoint> for EndpointRecord {
    fn from(ep: ProfileEndpoint) -> Self {
        let props = ep.properties;
        Self {
            id: ep.id,
            name: ep.name,
            endpoint_type: ep.endpoint_type,
            target: props.target,
            endpoint_status: props.endpoint_status,
            endpoint_monitor_status: props.endpoint_monitor_status,
            priority: props.priority,
            weight: props.weight,
            endpoint_location: props.endpoint_location,
            min_child_endpoints: props.min_child_endpoints,
            geo_mapping: props.geo_mapping,
            subnets: props.subnets,
            custom_headers: props.custom_headers,
        }
    }
}

/// Project the raw ARM profile into a [`ProfileRecord`].
pub fn normalize_profile(raw: TrafficManagerProfile) -> ProfileRecord {
    let props = raw.properties;
    ProfileRecord {
        name: raw.name,
        location: raw.location,
        profile_status: props.profile_status,
        traffic_routing_method: props.traffic_routing_method,
        dns_config: props.dns_config,
        monitor_config: props.monitor_config,
        endpoints: props.endpoints.into_iter().map(EndpointRecord::from).collect(),
        traffic_view_enrollment_status: props.traffic_view_enrollment_status,
        max_return: props.max_return,
        allowed_endpoint_record_types: props.allowed_endpoint_record_types,
    }
}
