//! Traffic Manager profile queries.

use log::debug;

use crate::client::ArmClient;
use crate::types::{AzureResult, AzureToken, ResourceLocator, TrafficManagerProfile};

/// Full URL of the profile resource.
pub fn profile_url(client: &ArmClient, locator: &ResourceLocator) -> String {
    client.arm_url(&locator.resource_id())
}

/// Get the profile configuration, endpoints included.
pub async fn get_profile(
    client: &ArmClient,
    token: &AzureToken,
    locator: &ResourceLocator,
) -> AzureResult<TrafficManagerProfile> {
    let url = profile_url(client, locator);
    let api = client.config().api_version_traffic_manager.as_str();
    debug!("get_profile({}) → {}", locator, url);
    client
        .get_json_with_query(&url, token, &[("api-version", api)])
        .await
}
