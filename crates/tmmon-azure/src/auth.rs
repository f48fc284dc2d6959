//! Managed identity authentication.
//!
//! Tokens come from the instance metadata service reachable only from inside
//! the Azure host. One attempt per call, no caching.

use log::debug;
use secrecy::SecretString;

use crate::client::ArmClient;
use crate::types::{AzureError, AzureResult, AzureToken, TokenResponse};

/// Acquire a management-scope token from the instance metadata service.
pub async fn acquire_managed_identity_token(client: &ArmClient) -> AzureResult<AzureToken> {
    let config = client.config();
    debug!(
        "Azure managed identity token request → {}",
        config.metadata_token_url
    );

    let query = [
        ("api-version", config.metadata_api_version.as_str()),
        ("resource", config.management_resource.as_str()),
    ];
    let resp: TokenResponse = client
        .get_metadata_json(&config.metadata_token_url, &query)
        .await?;
    token_from_response(resp)
}

/// Convert the raw metadata response into an [`AzureToken`].
/// An absent or empty `access_token` is an error.
fn token_from_response(resp: TokenResponse) -> AzureResult<AzureToken> {
    let access_token = resp
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(AzureError::missing_token)?;

    Ok(AzureToken {
        access_token: SecretString::new(access_token),
        token_type: resp.token_type,
        resource: resp.resource,
    })
}

// ─── Tests ──────────────────────────────────────────────────────────
