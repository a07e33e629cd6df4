//! Provider
//!
//! Host-facing entry points. The host configures the provider once, then
//! calls validate, plan, apply and read for individual resource instances
//! and data sources, possibly in parallel. Every call returns diagnostics
//! rather than failing.
//!
//! # Module Structure
//!
//! - [`lifecycle`] - Resource and data source traits and the shared driver
//! - [`registry`] - Catalog of registered types

pub mod lifecycle;
pub mod registry;

pub use lifecycle::{DataSource, Plan, Resource, StateResponse, Timeouts};
pub use registry::{registry, Registry};

use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::Error;
use crate::schema::{AttributePath, Diagnostics};
use crate::scp::ScpClient;
use serde_json::Value;

/// Provider instance holding the configured transport
pub struct Provider {
    registry: &'static Registry,
    client: Option<ScpClient>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(kind: &str, name: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.error(
        &AttributePath::root(),
        format!("unknown {} type '{}'", kind, name),
    );
    diags
}

impl Provider {
    pub fn new() -> Self {
        Self {
            registry: registry(),
            client: None,
        }
    }

    /// Provider built around an existing client
    pub fn with_client(client: ScpClient) -> Self {
        Self {
            registry: registry(),
            client: Some(client),
        }
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Validate the configuration and build the transport
    pub fn configure(&mut self, config: &ProviderConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Err(e) = config.validate() {
            diags.error(&AttributePath::root(), format!("{:#}", e));
            return diags;
        }
        match ScpClient::new(config) {
            Ok(client) => {
                tracing::info!(
                    "configured for project {} at {}",
                    config.project_id,
                    config.service_host
                );
                self.client = Some(client);
            }
            Err(e) => diags.extend(Diagnostics::from(e)),
        }
        diags
    }

    pub fn client(&self) -> Result<&ScpClient, Error> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Config("provider is not configured".to_string()))
    }

    /// Catalog of every resource and data source schema
    pub fn schema(&self) -> Value {
        self.registry.describe()
    }

    pub fn validate_resource(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.registry.resource(type_name) {
            Some(entry) => entry.validate(config),
            None => unknown("resource", type_name),
        }
    }

    pub fn validate_data_source(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.registry.data_source(type_name) {
            Some(entry) => entry.validate(config),
            None => unknown("data source", type_name),
        }
    }

    pub fn plan_resource(
        &self,
        type_name: &str,
        prior: Option<&Value>,
        proposed: Option<&Value>,
    ) -> Plan {
        match self.registry.resource(type_name) {
            Some(entry) => entry.plan(prior, proposed),
            None => Plan {
                diagnostics: unknown("resource", type_name),
                ..Default::default()
            },
        }
    }

    /// Create, update or delete one instance
    pub async fn apply_resource(
        &self,
        ctx: &Context,
        type_name: &str,
        prior: Option<&Value>,
        planned: Option<&Value>,
    ) -> StateResponse {
        let Some(entry) = self.registry.resource(type_name) else {
            return StateResponse {
                state: prior.cloned(),
                diagnostics: unknown("resource", type_name),
            };
        };
        match self.client() {
            Ok(client) => entry.apply(ctx, client, prior, planned).await,
            Err(e) => StateResponse {
                state: prior.cloned(),
                diagnostics: e.into(),
            },
        }
    }

    pub async fn read_resource(&self, ctx: &Context, type_name: &str, current: &Value) -> StateResponse {
        let Some(entry) = self.registry.resource(type_name) else {
            return StateResponse {
                state: Some(current.clone()),
                diagnostics: unknown("resource", type_name),
            };
        };
        match self.client() {
            Ok(client) => entry.read(ctx, client, current).await,
            Err(e) => StateResponse {
                state: Some(current.clone()),
                diagnostics: e.into(),
            },
        }
    }

    pub async fn read_data_source(&self, ctx: &Context, type_name: &str, config: &Value) -> StateResponse {
        let Some(entry) = self.registry.data_source(type_name) else {
            return StateResponse {
                state: None,
                diagnostics: unknown("data source", type_name),
            };
        };
        match self.client() {
            Ok(client) => entry.read(ctx, client, config).await,
            Err(e) => StateResponse {
                state: None,
                diagnostics: e.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_type_is_a_diagnostic() {
        let provider = Provider::new();
        let diags = provider.validate_resource("scp_nope", &json!({}));
        assert!(diags.has_errors());
        assert!(diags.to_string().contains("scp_nope"));
    }

    #[test]
    fn test_configure_rejects_missing_project() {
        let mut provider = Provider::new();
        let config = ProviderConfig {
            service_host: "https://openapi.example.com".to_string(),
            token: Some("t".to_string()),
            ..Default::default()
        };
        let diags = provider.configure(&config);
        assert!(diags.has_errors());
        assert!(provider.client().is_err());
    }

    #[tokio::test]
    async fn test_apply_before_configure_fails() {
        let provider = Provider::new();
        let planned = json!({"name": "vpc1", "region": "KR-WEST-1"});
        let resp = provider
            .apply_resource(&Context::new(), "scp_vpc", None, Some(&planned))
            .await;
        assert!(resp.diagnostics.has_errors());
        assert!(resp.state.is_none());
    }

    #[test]
    fn test_plan_force_new_requires_replace() {
        let provider = Provider::new();
        let prior = json!({
            "id": "VPC-1",
            "name": "vpc1",
            "region": "KR-WEST-1",
            "description": "",
            "state": "ACTIVE",
        });
        let proposed = json!({"name": "vpc2", "region": "KR-WEST-1", "description": ""});
        let plan = provider.plan_resource("scp_vpc", Some(&prior), Some(&proposed));
        assert!(!plan.diagnostics.has_errors(), "{}", plan.diagnostics);
        assert!(plan.requires_replace());
        assert_eq!(plan.requires_replace[0].to_string(), "name");
        // cloud-assigned values are unknown for the replacement
        let planned = plan.planned_state.unwrap();
        assert!(planned.get("state").is_none());
        assert!(planned.get("id").is_none());
    }

    #[test]
    fn test_plan_in_place_carries_computed() {
        let provider = Provider::new();
        let prior = json!({
            "id": "VPC-1",
            "name": "vpc1",
            "region": "KR-WEST-1",
            "description": "old",
            "state": "ACTIVE",
        });
        let proposed = json!({"name": "vpc1", "region": "KR-WEST-1", "description": "new"});
        let plan = provider.plan_resource("scp_vpc", Some(&prior), Some(&proposed));
        assert!(!plan.requires_replace());
        let planned = plan.planned_state.unwrap();
        assert_eq!(planned["state"], "ACTIVE");
        assert_eq!(planned["id"], "VPC-1");
    }

    #[test]
    fn test_plan_immutable_field_is_rejected() {
        let provider = Provider::new();
        let prior = json!({
            "id": "BS-1",
            "name": "disk1",
            "region": "KR-WEST-1",
            "storage_size_gb": 100,
            "encrypted": false,
            "disk_type": "SSD",
            "virtual_server_id": "VS-1",
        });
        let proposed = json!({
            "name": "disk1",
            "region": "KR-WEST-1",
            "storage_size_gb": 200,
            "encrypted": false,
            "disk_type": "SSD",
            "virtual_server_id": "VS-1",
        });
        let plan = provider.plan_resource("scp_block_storage", Some(&prior), Some(&proposed));
        assert!(plan.diagnostics.has_errors());
        assert!(plan.diagnostics.to_string().contains("storage_size_gb"));
    }

    #[test]
    fn test_plan_destroy() {
        let provider = Provider::new();
        let prior = json!({"id": "VPC-1", "name": "vpc1", "region": "KR-WEST-1"});
        let plan = provider.plan_resource("scp_vpc", Some(&prior), None);
        assert!(plan.planned_state.is_none());
        assert!(plan.diagnostics.is_empty());
    }
}
