//! # Traffic Manager monitor – Azure access layer
//!
//! Read-only Azure Resource Manager (ARM) calls needed to monitor a single
//! Traffic Manager profile.
//!
//! ## Features
//!
//! - **Managed identity** – bearer token from the instance metadata service
//! - **Traffic Manager** – profile configuration with endpoints
//! - **Resource Health** – platform availability verdict
//! - **Monitor** – recent per-endpoint QPS and probe state

pub mod types;
pub mod client;
pub mod auth;
pub mod traffic_manager;
pub mod resource_health;
pub mod monitor;
