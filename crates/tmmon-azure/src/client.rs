//! HTTP client wrapper for Azure Resource Manager and the instance
//! metadata service.
//!
//! Handles bearer-token injection, per-call timeouts and standard ARM error
//! extraction. Requests are single-shot: nothing here retries.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::types::{AzureConfig, AzureError, AzureErrorKind, AzureResult, AzureToken};

/// HTTP client bound to one [`AzureConfig`].
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: Client,
    config: AzureConfig,
}

impl ArmClient {
    pub fn new(config: AzureConfig) -> AzureResult<Self> {
        let app_name = env!("CARGO_PKG_NAME");
        let app_version = env!("CARGO_PKG_VERSION");
        let http = Client::builder()
            .user_agent(format!("{app_name}/{app_version}"))
            .build()
            .map_err(|e| {
                AzureError::new(AzureErrorKind::Network, format!("build HTTP client: {e}"))
            })?;
        Ok(Self { http, config })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build an ARM management URL: `{arm_base}{path}`.
    pub fn arm_url(&self, path: &str) -> String {
        format!("{}{}", self.config.arm_base.trim_end_matches('/'), path)
    }

    // ── Auth header builder ──────────────────────────────────────────

    fn auth_headers(token: &AzureToken) -> AzureResult<HeaderMap> {
        let secret = token.access_token.expose_secret();
        if secret.is_empty() {
            return Err(AzureError::missing_token());
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {secret}")).map_err(|e| {
            AzureError::new(AzureErrorKind::Auth, format!("Header value error: {e}"))
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    // ── Core HTTP verbs ──────────────────────────────────────────────

    /// Authenticated GET against ARM, bounded by `query_timeout`.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &AzureToken,
        query: &[(&str, &str)],
    ) -> AzureResult<T> {
        let headers = Self::auth_headers(token)?;
        debug!("Azure GET {} {:?}", url, query);

        let resp = self
            .http
            .get(url)
            .headers(headers)
            .query(query)
            .timeout(self.config.query_timeout)
            .send()
            .await
            .map_err(|e| AzureError::from_transport(&e))?;

        read_json(url, resp).await
    }

    /// Unauthenticated GET against the instance metadata service,
    /// bounded by `token_timeout`.
    pub async fn get_metadata_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> AzureResult<T> {
        debug!("Azure metadata GET {} {:?}", url, query);

        let resp = self
            .http
            .get(url)
            .header("Metadata", "true")
            .query(query)
            .timeout(self.config.token_timeout)
            .send()
            .await
            .map_err(|e| AzureError::from_transport(&e))?;

        read_json(url, resp).await
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn read_json<T: DeserializeOwned>(url: &str, resp: Response) -> AzureResult<T> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                AzureError::from_transport(&e)
            } else {
                AzureError::new(AzureErrorKind::Parse, format!("JSON parse from {url}: {e}"))
            }
        });
    }

    let body = resp.text().await.unwrap_or_default();
    debug!("Azure GET {} → {}", url, status);
    Err(AzureError::from_status(status.as_u16(), &body))
}

// ─── Tests ──────────────────────────────────────────────────────────
