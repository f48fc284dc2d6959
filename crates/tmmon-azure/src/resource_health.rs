//! Azure Resource Health – current availability status of a resource.

use log::debug;

use crate::client::ArmClient;
use crate::types::{AvailabilityStatus, AzureResult, AzureToken, ResourceLocator};

/// Full URL of the resource's `availabilityStatuses/current` sub-resource.
pub fn availability_status_url(client: &ArmClient, locator: &ResourceLocator) -> String {
    client.arm_url(&format!(
        "{}/providers/Microsoft.ResourceHealth/availabilityStatuses/current",
        locator.resource_id()
    ))
}

/// Get the platform-computed availability verdict for the profile.
pub async fn get_availability_status(
    client: &ArmClient,
    token: &AzureToken,
    locator: &ResourceLocator,
) -> AzureResult<AvailabilityStatus> {
    let url = availability_status_url(client, locator);
    let api = client.config().api_version_resource_health.as_str();
    debug!("get_availability_status({}) → {}", locator, url);
    client
        .get_json_with_query(&url, token, &[("api-version", api)])
        .await
}
