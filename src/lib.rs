//! Infrastructure-as-code provider for Samsung Cloud Platform
//!
//! Exposes the platform's REST control plane as a catalog of resource types
//! (create, read, update, delete) and data sources (read-only lookups) that a
//! declarative configuration engine can plan and reconcile.
//!
//! # Module Structure
//!
//! - [`config`] - Provider settings from file and environment
//! - [`scp`] - Transport, request signing and wire types
//! - [`service`] - One client façade per cloud service
//! - [`context`] - Cancellation shared by HTTP calls and polls
//! - [`poll`] - State waiter used after asynchronous submissions
//! - [`resolver`] - Region, product group and product lookups
//! - [`tags`] - Tag codec and reconcile
//! - [`lock`] - Keyed mutual exclusion
//! - [`schema`] - Schema model, resource data and diagnostics
//! - [`validate`] - Reusable attribute validators
//! - [`filter`] - Client-side filters for list data sources
//! - [`convert`] - Wire struct to state map conversion
//! - [`provider`] - Host-facing entry points and the lifecycle driver
//! - [`resources`] - Managed resource types
//! - [`data_sources`] - Standalone data sources

pub mod config;
pub mod context;
pub mod convert;
pub mod data_sources;
pub mod error;
pub mod filter;
pub mod lock;
pub mod poll;
pub mod provider;
pub mod resolver;
pub mod resources;
pub mod schema;
pub mod scp;
pub mod service;
pub mod tags;
pub mod validate;

pub use error::{Error, Result};
pub use provider::Provider;

/// Version injected at compile time via SCP_PROVIDER_VERSION (set by CI),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("SCP_PROVIDER_VERSION") {
    Some(v) => v,
    None => "dev",
};
