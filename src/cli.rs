use clap::Parser;
use tmmon_azure::types::ResourceLocator;

/// Traffic Manager monitor: returns JSON with properties, metrics, and health status.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Subscription ID (GUID)
    pub subscription_id: String,

    /// Resource group name
    pub resource_group: String,

    /// Traffic Manager profile name
    pub profile_name: String,
}

impl Cli {
    pub fn locator(&self) -> ResourceLocator {
        ResourceLocator::new(
            self.subscription_id.clone(),
            self.resource_group.clone(),
            self.profile_name.clone(),
        )
    }
}
