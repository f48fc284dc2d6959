//! # tm-monitor
//!
//! Reports the status of one Azure Traffic Manager profile as JSON for a
//! monitoring system: configuration, recent endpoint metrics and a single
//! health verdict.
//!
//! The run is strictly sequential: token → profile → metrics → health →
//! report. See [`pipeline::run`].

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use tmmon_azure::types::ResourceLocator;
