//! Core types for the Azure Resource Manager surfaces the monitor reads.
//!
//! Every wire struct here is lenient: keys may be missing or `null` and
//! deserialization still succeeds with `None` / empty collections.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

// ─── Error types ─────────────────────────────────────────────────────

/// Categorised error kinds for Azure operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AzureErrorKind {
    Auth,
    NotFound,
    Forbidden,
    RateLimit,
    BadRequest,
    ServerError,
    Timeout,
    Network,
    Parse,
    MissingToken,
}

impl fmt::Display for AzureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "Authentication error"),
            Self::NotFound => write!(f, "Resource not found"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::RateLimit => write!(f, "Rate limit exceeded"),
            Self::BadRequest => write!(f, "Bad request"),
            Self::ServerError => write!(f, "Server error"),
            Self::Timeout => write!(f, "Request timeout"),
            Self::Network => write!(f, "Network error"),
            Self::Parse => write!(f, "Parse error"),
            Self::MissingToken => write!(f, "Missing access token"),
        }
    }
}

/// Main error type for Azure operations.
#[derive(Debug, Clone)]
pub struct AzureError {
    pub kind: AzureErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
}

/// Longest response body excerpt carried in an error message.
const MAX_BODY_EXCERPT: usize = 500;

impl AzureError {
    pub fn new(kind: AzureErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(kind: AzureErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: Some(status),
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            400 => AzureErrorKind::BadRequest,
            401 => AzureErrorKind::Auth,
            403 => AzureErrorKind::Forbidden,
            404 => AzureErrorKind::NotFound,
            429 => AzureErrorKind::RateLimit,
            500..=599 => AzureErrorKind::ServerError,
            _ => AzureErrorKind::Network,
        };
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
            format!("HTTP {status}: {excerpt}")
        };
        Self::with_status(kind, message, status)
    }

    /// Classify a transport-level failure (connect, timeout, body read).
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            AzureErrorKind::Timeout
        } else {
            AzureErrorKind::Network
        };
        Self::new(kind, err.to_string())
    }

    pub fn missing_token() -> Self {
        Self::new(
            AzureErrorKind::MissingToken,
            "token response did not contain an access_token",
        )
    }
}

impl fmt::Display for AzureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for AzureError {}

pub type AzureResult<T> = Result<T, AzureError>;

// ─── Managed identity token ──────────────────────────────────────────

/// Bearer token for management-plane calls. Lives for one process run.
#[derive(Debug, Clone)]
pub struct AzureToken {
    pub access_token: SecretString,
    pub token_type: Option<String>,
    pub resource: Option<String>,
}

/// Raw metadata-service token response.
///
/// The instance metadata service reports `expires_in` / `expires_on` as
/// strings, so only the fields the monitor needs are typed.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

// ─── Resource locator ────────────────────────────────────────────────

/// Identifies the Traffic Manager profile being monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLocator {
    pub subscription_id: String,
    pub resource_group: String,
    pub profile_name: String,
}

impl ResourceLocator {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        profile_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            profile_name: profile_name.into(),
        }
    }

    /// Full ARM resource ID of the profile (no host, leading slash).
    pub fn resource_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/trafficmanagerprofiles/{}",
            self.subscription_id, self.resource_group, self.profile_name
        )
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subscription_id, self.resource_group, self.profile_name
        )
    }
}

// ─── Traffic Manager profile ─────────────────────────────────────────

/// `Enabled` / `Disabled`, with any other value carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnabledState {
    Enabled,
    Disabled,
    Other(String),
}

impl From<String> for EnabledState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Enabled" => Self::Enabled,
            "Disabled" => Self::Disabled,
            _ => Self::Other(value),
        }
    }
}

impl From<EnabledState> for String {
    fn from(value: EnabledState) -> String {
        match value {
            EnabledState::Enabled => "Enabled".into(),
            EnabledState::Disabled => "Disabled".into(),
            EnabledState::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrafficManagerProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: ProfileProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileProperties {
    #[serde(default)]
    pub profile_status: Option<EnabledState>,
    #[serde(default)]
    pub traffic_routing_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns_config: DnsConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monitor_config: MonitorConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoints: Vec<ProfileEndpoint>,
    #[serde(default)]
    pub traffic_view_enrollment_status: Option<String>,
    #[serde(default)]
    pub max_return: Option<i64>,
    #[serde(default)]
    pub allowed_endpoint_record_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    #[serde(default)]
    pub relative_name: Option<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default)]
    pub profile_monitor_status: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub interval_in_seconds: Option<i64>,
    #[serde(default)]
    pub timeout_in_seconds: Option<i64>,
    #[serde(default)]
    pub tolerated_number_of_failures: Option<i64>,
    #[serde(default)]
    pub expected_status_code_ranges: Option<serde_json::Value>,
    #[serde(default)]
    pub custom_headers: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEndpoint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub endpoint_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: EndpointProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EndpointProperties {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub endpoint_status: Option<EnabledState>,
    #[serde(default)]
    pub endpoint_monitor_status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub endpoint_location: Option<String>,
    #[serde(default)]
    pub min_child_endpoints: Option<i64>,
    #[serde(default)]
    pub geo_mapping: Option<serde_json::Value>,
    #[serde(default)]
    pub subnets: Option<serde_json::Value>,
    #[serde(default)]
    pub custom_headers: Option<serde_json::Value>,
}

// ─── Resource Health ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: AvailabilityStatusProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatusProperties {
    #[serde(default)]
    pub availability_state: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reason_type: Option<String>,
    #[serde(default)]
    pub occured_time: Option<String>,
}

// ─── Monitor / Metrics ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricName {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub localized_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponse {
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default)]
    pub timespan: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: Vec<Metric>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<MetricName>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeseries: Vec<TimeSeries>,
}

impl Metric {
    /// The metric's invariant name (`name.value`), if reported.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.value.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimeSeries {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadatavalues: Vec<MetadataValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<MetricValue>,
}

impl TimeSeries {
    /// Value of the metadata tag called `tag`, if present.
    pub fn metadata(&self, tag: &str) -> Option<&str> {
        self.metadatavalues
            .iter()
            .find(|mv| mv.name.as_ref().and_then(|n| n.value.as_deref()) == Some(tag))
            .and_then(|mv| mv.value.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataValue {
    #[serde(default)]
    pub name: Option<MetricName>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
}

// ─── Configuration ──────────────────────────────────────────────────

/// Endpoints, API versions and timeouts used by [`crate::client::ArmClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub arm_base: String,
    pub metadata_token_url: String,
    pub metadata_api_version: String,
    pub management_resource: String,
    pub api_version_traffic_manager: String,
    pub api_version_resource_health: String,
    pub api_version_monitor: String,
    pub token_timeout: Duration,
    pub query_timeout: Duration,
}

impl AzureConfig {
    pub fn new() -> Self {
        Self {
            arm_base: ARM_BASE.into(),
            metadata_token_url: METADATA_TOKEN_URL.into(),
            metadata_api_version: api_versions::METADATA_IDENTITY.into(),
            management_resource: MANAGEMENT_RESOURCE.into(),
            api_version_traffic_manager: api_versions::TRAFFIC_MANAGER.into(),
            api_version_resource_health: api_versions::RESOURCE_HEALTH.into(),
            api_version_monitor: api_versions::MONITOR.into(),
            token_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Azure API version constants ────────────────────────────────────

pub mod api_versions {
    pub const METADATA_IDENTITY: &str = "2018-02-01";
    pub const TRAFFIC_MANAGER: &str = "2022-04-01";
    pub const RESOURCE_HEALTH: &str = "2022-10-01";
    pub const MONITOR: &str = "2018-01-01";
}

pub const ARM_BASE: &str = "https://management.azure.com";
pub const METADATA_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Per-endpoint query rate.
pub const METRIC_QPS_BY_ENDPOINT: &str = "QpsByEndpoint";
/// Probe agent verdict per endpoint (1 online, 0.5 degraded, else offline).
pub const METRIC_ENDPOINT_STATE: &str = "ProbeAgentCurrentEndpointStateByProfileResourceId";
/// Metadata tag carrying the endpoint resource ID on probe-state series.
pub const ENDPOINT_STATE_TAG: &str = "ProfileResourceId";

// ─── Serde helpers ──────────────────────────────────────────────────

/// Treat an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Tests ──────────────────────────────────────────────────────────
