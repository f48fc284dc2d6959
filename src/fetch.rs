//! Resource fetcher: the three read-only queries of a run.
//!
//! Each query acquires its own token. Only the profile query can abort the
//! run; health and metrics failures become warnings.

use chrono::{DateTime, Utc};
use tmmon_azure::auth::acquire_managed_identity_token;
use tmmon_azure::client::ArmClient;
use tmmon_azure::types::{
    AvailabilityStatus, AzureResult, AzureToken, MetricResponse, ResourceLocator,
    TrafficManagerProfile,
};
use tmmon_azure::{monitor, resource_health, traffic_manager};
use tracing::{error, warn};

use crate::error::{MonitorError, QueryWarning};
use crate::report::WarningSink;

pub struct Fetcher {
    client: ArmClient,
}

impl Fetcher {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    async fn token(&self) -> AzureResult<AzureToken> {
        acquire_managed_identity_token(&self.client).await
    }

    /// Mandatory: a token or query failure aborts the run.
    #[tracing::instrument(skip_all, fields(%locator))]
    pub async fn fetch_profile(
        &self,
        locator: &ResourceLocator,
    ) -> Result<TrafficManagerProfile, MonitorError> {
        let token = self.token().await.map_err(|e| {
            error!(error = %e, "managed identity token unavailable");
            MonitorError::Token(e)
        })?;
        traffic_manager::get_profile(&self.client, &token, locator)
            .await
            .map_err(|e| {
                error!(error = %e, "profile query failed");
                MonitorError::ProfileQuery(e)
            })
    }

    /// Optional: `None` plus a warning on failure.
    #[tracing::instrument(skip_all, fields(%locator))]
    pub async fn fetch_health(
        &self,
        locator: &ResourceLocator,
        warnings: &mut impl WarningSink,
    ) -> Option<AvailabilityStatus> {
        match self.health(locator).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "resource health unavailable");
                warnings.warning(&QueryWarning::Health(e).to_string());
                None
            }
        }
    }

    /// Optional: an empty response plus a warning on failure.
    #[tracing::instrument(skip_all, fields(%locator))]
    pub async fn fetch_metrics(
        &self,
        locator: &ResourceLocator,
        now: DateTime<Utc>,
        warnings: &mut impl WarningSink,
    ) -> MetricResponse {
        match self.metrics(locator, now).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "metrics unavailable");
                warnings.warning(&QueryWarning::Metrics(e).to_string());
                MetricResponse::default()
            }
        }
    }

    async fn health(&self, locator: &ResourceLocator) -> AzureResult<AvailabilityStatus> {
        let token = self.token().await?;
        resource_health::get_availability_status(&self.client, &token, locator).await
    }

    async fn metrics(
        &self,
        locator: &ResourceLocator,
        now: DateTime<Utc>,
    ) -> AzureResult<MetricResponse> {
        let token = self.token().await?;
        monitor::query_endpoint_metrics(&self.client, &token, locator, now).await
    }
}

#[cfg(test)]
mod tests {
    use tmmon_azure::types::AzureConfig;

    use super::*;

    impl WarningSink for Vec<String> {
        fn warning(&mut self, message: &str) {
            self.push(message.to_string());
        }
    }

    /// Nothing listens on the discard port, so every call fails fast.
    fn unreachable_fetcher() -> Fetcher {
        let config = AzureConfig {
            arm_base: "http://127.0.0.1:9".into(),
            metadata_token_url: "http://127.0.0.1:9/metadata/identity/oauth2/token".into(),
            ..AzureConfig::new()
        };
        Fetcher::new(ArmClient::new(config).unwrap())
    }

    fn locator() -> ResourceLocator {
        ResourceLocator::new("s1", "rg1", "tm1")
    }

    #[tokio::test]
    async fn profile_token_failure_is_fatal() {
        let err = unreachable_fetcher().fetch_profile(&locator()).await.unwrap_err();
        assert!(matches!(err, MonitorError::Token(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn health_failure_degrades_to_none_with_warning() {
        let mut warnings = Vec::new();
        let health = unreachable_fetcher().fetch_health(&locator(), &mut warnings).await;
        assert!(health.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Error querying Resource Health: "));
    }

    #[tokio::test]
    async fn metrics_failure_degrades_to_empty_with_warning() {
        let mut warnings = Vec::new();
        let metrics = unreachable_fetcher()
            .fetch_metrics(&locator(), Utc::now(), &mut warnings)
            .await;
        assert!(metrics.value.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Error querying metrics: "));
    }
}
