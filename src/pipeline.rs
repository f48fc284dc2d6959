//! authenticate → fetch → normalize → derive health → emit.
//!
//! Every stage returns a value or a tagged failure; [`run`] is the one place
//! that turns the outcome into output and an exit code.

use std::any::Any;
use std::io::Write;
use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures::FutureExt;
use tmmon_azure::client::ArmClient;
use tmmon_azure::types::ResourceLocator;
use tracing::{debug, error, info};

use crate::config::MonitorSettings;
use crate::error::MonitorError;
use crate::fetch::Fetcher;
use crate::health::resolve;
use crate::metrics::reduce;
use crate::normalize::normalize_profile;
use crate::report::{render_report, ReportRecord, Reporter};

/// Run the whole monitor once and return the process exit code.
///
/// At most one JSON document reaches `reporter`'s primary stream: the report
/// on success, an error line otherwise. A report whose write fails midway is
/// not followed by an error line. Panics are caught and reported as
/// unexpected errors.
pub async fn run<O: Write, E: Write>(
    settings: &MonitorSettings,
    locator: &ResourceLocator,
    reporter: &mut Reporter<O, E>,
) -> u8 {
    let assembled = AssertUnwindSafe(assemble(settings, locator, reporter))
        .catch_unwind()
        .await;
    let outcome = assembled
        .unwrap_or_else(|panic| Err(MonitorError::Unexpected(panic_message(panic.as_ref()))))
        .and_then(|record| {
            render_report(&record)
                .map(|rendered| (record, rendered))
                .map_err(|e| MonitorError::Unexpected(format!("serialize report: {e}")))
        });

    match outcome {
        Ok((record, rendered)) => match reporter.write_report(&rendered) {
            Ok(()) => {
                info!(%locator, health = %record.health_status, "report emitted");
                0
            }
            // Part of the document may already be out: no error line after it.
            Err(e) => {
                let e = MonitorError::Unexpected(format!("write report: {e}"));
                error!(%locator, error = %e, "report write failed");
                e.exit_code()
            }
        },
        Err(e) => {
            error!(%locator, error = %e, "run failed");
            reporter.emit_error(&e);
            e.exit_code()
        }
    }
}

async fn assemble<O: Write, E: Write>(
    settings: &MonitorSettings,
    locator: &ResourceLocator,
    reporter: &mut Reporter<O, E>,
) -> Result<ReportRecord, MonitorError> {
    let client = ArmClient::new(settings.azure.clone())
        .map_err(|e| MonitorError::Unexpected(e.to_string()))?;
    let fetcher = Fetcher::new(client);

    let profile = normalize_profile(fetcher.fetch_profile(locator).await?);

    let raw_metrics = fetcher.fetch_metrics(locator, Utc::now(), reporter).await;
    let metrics = reduce(&raw_metrics);
    if metrics.is_empty() {
        debug!(%locator, "no metric data in window");
    }

    let platform = fetcher.fetch_health(locator, reporter).await;
    let health_status = resolve(platform.as_ref(), Some(&profile), &metrics);

    Ok(ReportRecord {
        profile,
        metrics,
        health_status,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("panic with non-string payload")
    }
}
