//! Failure classes of a monitoring run.
//!
//! Only [`MonitorError`] aborts the run. Health and metrics failures are
//! [`QueryWarning`]s: reported on the side channel, then the run carries on.

use tmmon_azure::types::AzureError;

/// A fatal outcome, mapped to a process exit code by [`MonitorError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The managed identity token could not be obtained.
    #[error("Failed to obtain MSI token.")]
    Token(#[source] AzureError),

    /// The mandatory profile query failed.
    #[error("Error querying Traffic Manager: {0}")]
    ProfileQuery(#[source] AzureError),

    /// Anything else, including panics caught at the top level.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl MonitorError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Token(_) => 1,
            Self::ProfileQuery(_) => 2,
            Self::Unexpected(_) => 3,
        }
    }
}

/// A non-fatal query failure.
#[derive(Debug, thiserror::Error)]
pub enum QueryWarning {
    #[error("Error querying Resource Health: {0}")]
    Health(#[source] AzureError),

    #[error("Error querying metrics: {0}")]
    Metrics(#[source] AzureError),
}

#[cfg(test)]
mod tests {
    use tmmon_azure::types::AzureErrorKind;

    use super::*;

    #[test]
    fn exit_codes() {
        let e = AzureError::new(AzureErrorKind::Network, "refused");
        assert_eq!(MonitorError::Token(e.clone()).exit_code(), 1);
        assert_eq!(MonitorError::ProfileQuery(e).exit_code(), 2);
        assert_eq!(MonitorError::Unexpected("boom".into()).exit_code(), 3);
    }

    #[test]
    fn token_message_hides_cause() {
        let e = MonitorError::Token(AzureError::new(AzureErrorKind::Timeout, "5s elapsed"));
        assert_eq!(e.to_string(), "Failed to obtain MSI token.");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn profile_and_warning_messages() {
        let e = MonitorError::ProfileQuery(AzureError::from_status(404, "gone"));
        assert_eq!(
            e.to_string(),
            "Error querying Traffic Manager: [Resource not found] HTTP 404: gone"
        );

        let w = QueryWarning::Health(AzureError::new(AzureErrorKind::Timeout, "deadline"));
        assert_eq!(
            w.to_string(),
            "Error querying Resource Health: [Request timeout] deadline"
        );
        let w = QueryWarning::Metrics(AzureError::from_status(500, ""));
        assert_eq!(w.to_string(), "Error querying metrics: [Server error] HTTP 500");
    }
}
