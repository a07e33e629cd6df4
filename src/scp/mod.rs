//! SCP API interaction module
//!
//! Transport for the SCP REST control plane: credentials, the shared HTTP
//! client, per-service base URLs and the envelope types every service reuses.
//!
//! # Module Structure
//!
//! - [`auth`] - Token, signed-credential and API-key headers
//! - [`client`] - Main SCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`types`] - List, async-acknowledgement and tag payloads
//!
//! # Example
//!
//! ```ignore
//! use crate::scp::client::{Query, ScpClient, Service};
//!
//! async fn example(config: &ProviderConfig) -> crate::Result<()> {
//!     let client = ScpClient::new(config)?;
//!     let ctx = Context::new();
//!     let vpcs: serde_json::Value = client.get(&ctx, Service::Vpc, "v2/vpcs", &Query::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod types;

pub use client::{Query, ScpClient, Service};
pub use types::{all_pages, AsyncResponse, ListResponse, Page, Tag};
