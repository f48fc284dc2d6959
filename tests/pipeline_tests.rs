//! End-to-end runs against an in-process stand-in for the instance metadata
//! service and Azure Resource Manager.

use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tm_monitor::config::MonitorSettings;
use tm_monitor::pipeline;
use tm_monitor::report::Reporter;
use tm_monitor::ResourceLocator;
use tmmon_azure::types::AzureConfig;

const TOKEN: &str = "test-token";
const TOKEN_PATH: &str = "/metadata/identity/oauth2/token";

// ── Mock service ────────────────────────────────────────────────────

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(StatusCode),
    Slow,
}

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    query: HashMap<String, String>,
    metadata: Option<String>,
    authorization: Option<String>,
}

struct MockAzure {
    token: Reply,
    profile: Reply,
    health: Reply,
    metrics: Reply,
    requests: Mutex<Vec<Recorded>>,
}

impl MockAzure {
    fn healthy() -> Self {
        Self {
            token: Reply::Json(json!({
                "access_token": TOKEN,
                "token_type": "Bearer",
                "resource": "https://management.azure.com/",
            })),
            profile: Reply::Json(profile_json()),
            health: Reply::Json(health_json("Available")),
            metrics: Reply::Json(metrics_json(&[("ep-a", 1.0), ("ep-b", 1.0)])),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, uri: &Uri, headers: &HeaderMap, query: HashMap<String, String>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let recorded = Recorded {
            path: uri.path().to_string(),
            query,
            metadata: header("metadata"),
            authorization: header("authorization"),
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(recorded);
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

async fn respond(reply: &Reply) -> Response {
    match reply {
        Reply::Json(body) => (StatusCode::OK, Json(body.clone())).into_response(),
        Reply::Status(status) => (*status, "mock failure").into_response(),
        Reply::Slow => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Json(json!({}))).into_response()
        }
    }
}

async fn token_handler(
    State(state): State<Arc<MockAzure>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(&uri, &headers, query);
    if headers.get("metadata").and_then(|v| v.to_str().ok()) != Some("true") {
        return (StatusCode::BAD_REQUEST, "missing Metadata header").into_response();
    }
    respond(&state.token).await
}

async fn arm_handler(
    State(state): State<Arc<MockAzure>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(&uri, &headers, query);
    let bearer = format!("Bearer {TOKEN}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path();
    let reply = if path.ends_with("/availabilityStatuses/current") {
        &state.health
    } else if path.ends_with("/microsoft.insights/metrics") {
        &state.metrics
    } else if path == profile_path() {
        &state.profile
    } else {
        return StatusCode::NOT_FOUND.into_response();
    };
    respond(reply).await
}

async fn start(mock: MockAzure) -> (SocketAddr, Arc<MockAzure>) {
    let state = Arc::new(mock);
    let app = Router::new()
        .route(TOKEN_PATH, get(token_handler))
        .fallback(arm_handler)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.ok();
    });
    (addr, state)
}

// ── Fixtures ────────────────────────────────────────────────────────

fn locator() -> ResourceLocator {
    ResourceLocator::new("sub-1", "rg-1", "tm-1")
}

fn profile_path() -> String {
    locator().resource_id()
}

fn endpoint_id(name: &str) -> String {
    format!("{}/azureEndpoints/{name}", profile_path())
}

fn endpoint_json(name: &str, status: &str) -> Value {
    json!({
        "id": endpoint_id(name),
        "name": name,
        "type": "Microsoft.Network/trafficManagerProfiles/azureEndpoints",
        "properties": {
            "target": format!("{name}.example.net"),
            "endpointStatus": status,
            "endpointMonitorStatus": "Online",
            "priority": 1,
            "weight": 1,
            "endpointLocation": "West Europe"
        }
    })
}

fn profile_json() -> Value {
    json!({
        "id": profile_path(),
        "name": "tm-1",
        "type": "Microsoft.Network/trafficManagerProfiles",
        "location": "global",
        "properties": {
            "profileStatus": "Enabled",
            "trafficRoutingMethod": "Performance",
            "dnsConfig": { "relativeName": "tm-1", "fqdn": "tm-1.trafficmanager.net", "ttl": 30 },
            "monitorConfig": {
                "profileMonitorStatus": "Online",
                "protocol": "HTTPS",
                "port": 443,
                "path": "/health",
                "intervalInSeconds": 30,
                "timeoutInSeconds": 10,
                "toleratedNumberOfFailures": 3
            },
            "endpoints": [
                endpoint_json("ep-a", "Enabled"),
                endpoint_json("ep-b", "Enabled"),
                endpoint_json("ep-c", "Disabled")
            ],
            "trafficViewEnrollmentStatus": "Disabled"
        }
    })
}

fn health_json(state: &str) -> Value {
    json!({
        "id": format!("{}/providers/Microsoft.ResourceHealth/availabilityStatuses/current", profile_path()),
        "name": "current",
        "properties": { "availabilityState": state, "summary": "mock" }
    })
}

fn metrics_json(probes: &[(&str, f64)]) -> Value {
    let series: Vec<Value> = probes
        .iter()
        .map(|(name, value)| {
            json!({
                "metadatavalues": [{
                    "name": { "value": "ProfileResourceId", "localizedValue": "ProfileResourceId" },
                    "value": endpoint_id(name)
                }],
                "data": [
                    { "timeStamp": "2026-01-01T00:00:00Z" },
                    { "timeStamp": "2026-01-01T00:01:00Z", "average": value, "maximum": value }
                ]
            })
        })
        .collect();

    json!({
        "cost": 0,
        "timespan": "2026-01-01T00:00:00Z/2026-01-01T00:05:00Z",
        "interval": "PT1M",
        "value": [
            {
                "name": { "value": "QpsByEndpoint", "localizedValue": "Queries by endpoint returned" },
                "unit": "Count",
                "timeseries": [{
                    "metadatavalues": [],
                    "data": [
                        { "timeStamp": "2026-01-01T00:00:00Z", "average": 2.0 },
                        { "timeStamp": "2026-01-01T00:01:00Z", "average": 4.5 }
                    ]
                }]
            },
            {
                "name": { "value": "ProbeAgentCurrentEndpointStateByProfileResourceId", "localizedValue": "Endpoint status by endpoint" },
                "unit": "Count",
                "timeseries": series
            }
        ]
    })
}

// ── Harness ─────────────────────────────────────────────────────────

struct RunOutput {
    code: u8,
    stdout: String,
    stderr: String,
}

impl RunOutput {
    fn report(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap()
    }

    fn warnings(&self) -> Vec<String> {
        self.stderr
            .lines()
            .map(|line| {
                let parsed: Value = serde_json::from_str(line).unwrap();
                parsed["warning"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

fn settings(addr: SocketAddr) -> MonitorSettings {
    MonitorSettings {
        azure: AzureConfig {
            arm_base: format!("http://{addr}"),
            metadata_token_url: format!("http://{addr}{TOKEN_PATH}"),
            token_timeout: Duration::from_secs(2),
            query_timeout: Duration::from_millis(500),
            ..AzureConfig::new()
        },
    }
}

async fn run_with<O: Write, E: Write>(
    mock: MockAzure,
    out: O,
    err: E,
) -> (u8, O, E, Arc<MockAzure>) {
    let (addr, state) = start(mock).await;
    let mut reporter = Reporter::new(out, err);
    let code = pipeline::run(&settings(addr), &locator(), &mut reporter).await;
    let (out, err) = reporter.into_inner();
    (code, out, err, state)
}

async fn run_against(mock: MockAzure) -> (RunOutput, Arc<MockAzure>) {
    let (code, out, err, state) = run_with(mock, Vec::new(), Vec::new()).await;
    let output = RunOutput {
        code,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    };
    (output, state)
}

/// Error stream whose first write panics.
struct PanickingWriter;

impl Write for PanickingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        panic!("stderr exploded");
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Primary stream that accepts `capacity` bytes, then fails.
struct TruncatingWriter {
    written: Vec<u8>,
    capacity: usize,
}

impl Write for TruncatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity - self.written.len();
        if room == 0 {
            return Err(io::Error::other("disk full"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn healthy_profile_produces_full_report() {
    let (out, _) = run_against(MockAzure::healthy()).await;

    assert_eq!(out.code, 0);
    assert_eq!(out.stderr, "");
    assert!(out
        .stdout
        .starts_with("{\n    \"data\": {\n        \"name\": \"tm-1\",\n"));
    assert!(out.stdout.ends_with("}\n"));

    let data = &out.report()["data"];
    assert_eq!(data["location"], "global");
    assert_eq!(data["profileStatus"], "Enabled");
    assert_eq!(data["trafficRoutingMethod"], "Performance");
    assert_eq!(data["dnsConfig"]["fqdn"], "tm-1.trafficmanager.net");
    assert_eq!(data["dnsConfig"]["ttl"], 30);
    assert_eq!(data["monitorConfig"]["path"], "/health");
    assert_eq!(data["endpoints"].as_array().unwrap().len(), 3);
    assert_eq!(data["endpoints"][0]["name"], "ep-a");
    assert_eq!(data["endpoints"][2]["endpointStatus"], "Disabled");
    assert_eq!(data["maxReturn"], Value::Null);
    assert_eq!(data["metrics"]["QpsByEndpoint"], 4.5);
    assert_eq!(
        data["metrics"]["endpointStates"],
        json!([
            { "endpoint": "ep-a", "state": "Online" },
            { "endpoint": "ep-b", "state": "Online" }
        ])
    );
    assert_eq!(data["healthStatus"], "Available");
}

#[tokio::test]
async fn token_failure_exits_with_code_one() {
    let mock = MockAzure {
        token: Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
        ..MockAzure::healthy()
    };
    let (out, state) = run_against(mock).await;

    assert_eq!(out.code, 1);
    assert_eq!(out.stdout, "{\"error\": \"Failed to obtain MSI token.\"}\n");
    assert_eq!(out.stderr, "");

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, TOKEN_PATH);
}

#[tokio::test]
async fn token_without_access_token_exits_with_code_one() {
    let mock = MockAzure {
        token: Reply::Json(json!({ "token_type": "Bearer" })),
        ..MockAzure::healthy()
    };
    let (out, _) = run_against(mock).await;

    assert_eq!(out.code, 1);
    assert_eq!(out.stdout, "{\"error\": \"Failed to obtain MSI token.\"}\n");
}

#[tokio::test]
async fn missing_profile_exits_with_code_two() {
    let mock = MockAzure {
        profile: Reply::Status(StatusCode::NOT_FOUND),
        ..MockAzure::healthy()
    };
    let (out, state) = run_against(mock).await;

    assert_eq!(out.code, 2);
    assert!(out
        .stdout
        .starts_with("{\"error\": \"Error querying Traffic Manager: "));
    assert!(out.stdout.contains("404"));
    assert_eq!(out.stdout.lines().count(), 1);
    assert_eq!(out.stderr, "");

    // Nothing after the profile query runs.
    assert_eq!(state.requests().len(), 2);
}

#[tokio::test]
async fn slow_health_query_becomes_warning() {
    let mock = MockAzure {
        health: Reply::Slow,
        metrics: Reply::Json(metrics_json(&[("ep-a", 1.0), ("ep-b", 0.0)])),
        ..MockAzure::healthy()
    };
    let (out, _) = run_against(mock).await;

    assert_eq!(out.code, 0);
    let warnings = out.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Error querying Resource Health: "));

    let data = &out.report()["data"];
    assert_eq!(
        data["metrics"]["endpointStates"],
        json!([
            { "endpoint": "ep-a", "state": "Online" },
            { "endpoint": "ep-b", "state": "Offline" }
        ])
    );
    assert_eq!(data["healthStatus"], "Degraded");
}

#[tokio::test]
async fn platform_verdict_wins_over_probe_states() {
    let mock = MockAzure {
        metrics: Reply::Json(metrics_json(&[("ep-a", 0.0), ("ep-b", 0.0)])),
        ..MockAzure::healthy()
    };
    let (out, _) = run_against(mock).await;

    assert_eq!(out.code, 0);
    assert_eq!(out.stderr, "");
    assert_eq!(out.report()["data"]["healthStatus"], "Available");
}

#[tokio::test]
async fn unrecognised_platform_state_is_unknown() {
    let mock = MockAzure {
        health: Reply::Json(health_json("Maintenance")),
        ..MockAzure::healthy()
    };
    let (out, _) = run_against(mock).await;

    assert_eq!(out.code, 0);
    assert_eq!(out.report()["data"]["healthStatus"], "Unknown");
}

#[tokio::test]
async fn optional_query_failures_fall_back_to_endpoint_config() {
    let mock = MockAzure {
        health: Reply::Status(StatusCode::FORBIDDEN),
        metrics: Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
        ..MockAzure::healthy()
    };
    let (out, _) = run_against(mock).await;

    assert_eq!(out.code, 0);
    let warnings = out.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].starts_with("Error querying metrics: "));
    assert!(warnings[1].starts_with("Error querying Resource Health: "));

    let data = &out.report()["data"];
    assert_eq!(data["metrics"], json!({}));
    // ep-c is disabled; both remaining endpoints are enabled.
    assert_eq!(data["healthStatus"], "Available");
}

#[tokio::test]
async fn requests_carry_expected_parameters() {
    let (out, state) = run_against(MockAzure::healthy()).await;
    assert_eq!(out.code, 0);

    let requests = state.requests();
    let tokens: Vec<&Recorded> = requests.iter().filter(|r| r.path == TOKEN_PATH).collect();
    assert_eq!(tokens.len(), 3);
    for token in &tokens {
        assert_eq!(token.metadata.as_deref(), Some("true"));
        assert_eq!(token.query["api-version"], "2018-02-01");
        assert_eq!(token.query["resource"], "https://management.azure.com/");
        assert_eq!(token.authorization, None);
    }

    let arm: Vec<&Recorded> = requests.iter().filter(|r| r.path != TOKEN_PATH).collect();
    assert_eq!(arm.len(), 3);
    for request in &arm {
        assert_eq!(request.authorization.as_deref(), Some("Bearer test-token"));
    }

    let profile = arm.iter().find(|r| r.path == profile_path()).unwrap();
    assert_eq!(profile.query["api-version"], "2022-04-01");

    let health = arm
        .iter()
        .find(|r| r.path.ends_with("/availabilityStatuses/current"))
        .unwrap();
    assert_eq!(health.query["api-version"], "2022-10-01");

    let metrics = arm
        .iter()
        .find(|r| r.path.ends_with("/microsoft.insights/metrics"))
        .unwrap();
    assert_eq!(metrics.query["api-version"], "2018-01-01");
    assert_eq!(metrics.query["interval"], "PT1M");
    assert_eq!(metrics.query["aggregation"], "Average,Maximum");
    assert_eq!(
        metrics.query["metricnames"],
        "QpsByEndpoint,ProbeAgentCurrentEndpointStateByProfileResourceId"
    );
    let (start, end) = metrics.query["timespan"].split_once('/').unwrap();
    assert_eq!(start.len(), "2026-01-01T00:00:00Z".len());
    assert!(start.ends_with('Z') && end.ends_with('Z'));
    assert!(start < end);
}

#[tokio::test]
async fn panic_during_run_exits_with_code_three() {
    let mock = MockAzure {
        metrics: Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
        ..MockAzure::healthy()
    };
    let (code, out, _, _) = run_with(mock, Vec::new(), PanickingWriter).await;

    assert_eq!(code, 3);
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out, "{\"error\": \"Unexpected error: stderr exploded\"}\n");
    assert!(!out.contains("\"data\""));
}

#[tokio::test]
async fn failed_report_write_is_not_followed_by_error_line() {
    let out = TruncatingWriter {
        written: Vec::new(),
        capacity: 16,
    };
    let (code, out, err, _) = run_with(MockAzure::healthy(), out, Vec::new()).await;

    assert_eq!(code, 3);
    let written = String::from_utf8(out.written).unwrap();
    assert_eq!(written.len(), 16);
    assert!(written.starts_with("{\n    \"data\""));
    assert!(!written.contains("error"));
    assert!(err.is_empty());
}
