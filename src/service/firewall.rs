//! Firewall Service
//!
//! Firewalls are created implicitly by gateways; the provider toggles them,
//! configures logging, and manages their rules. Rule edits on one firewall
//! conflict server-side (409) when they race, so callers serialize them.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page};
use serde::{Deserialize, Serialize};

// ============================================================================
// Firewalls
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FirewallDetail {
    pub firewall_id: String,
    pub firewall_name: String,
    /// `ACTIVE` when enabled, `INACTIVE` when disabled
    pub firewall_state: String,
    pub is_loggable: bool,
    pub object_id: String,
    pub object_type: String,
    pub vpc_id: String,
    pub product_type: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListFirewalls<'a> {
    pub vpc_id: Option<&'a str>,
    pub object_id: Option<&'a str>,
    pub firewall_name: Option<&'a str>,
    pub page: Page,
}

// ============================================================================
// Rules
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleService {
    /// TCP, UDP, ICMP or ALL
    pub service_type: String,
    /// Port, port range or empty for ICMP / ALL
    pub service_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FirewallRuleDetail {
    pub rule_id: String,
    pub rule_name: String,
    pub rule_state: String,
    pub rule_description: String,
    pub rule_direction: String,
    pub rule_action: String,
    pub is_rule_enabled: bool,
    pub source_ip_addresses: Vec<String>,
    pub destination_ip_addresses: Vec<String>,
    pub services: Vec<RuleService>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleRequest {
    pub rule_direction: String,
    pub rule_action: String,
    pub rule_description: String,
    pub is_rule_enabled: bool,
    pub source_ip_addresses: Vec<String>,
    pub destination_ip_addresses: Vec<String>,
    pub services: Vec<RuleService>,
}

pub struct FirewallService<'a> {
    client: &'a ScpClient,
}

impl<'a> FirewallService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, ctx: &Context, firewall_id: &str) -> Result<FirewallDetail> {
        let path = format!("v2/firewalls/{}", seg(firewall_id));
        self.client
            .get(ctx, Service::Firewall, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        opts: &ListFirewalls<'_>,
    ) -> Result<ListResponse<FirewallDetail>> {
        let query = Query::new()
            .opt("vpcId", opts.vpc_id)
            .opt("objectId", opts.object_id)
            .opt("firewallName", opts.firewall_name)
            .page(opts.page);
        self.client
            .get(ctx, Service::Firewall, "v2/firewalls", &query)
            .await
    }

    /// Enable or disable the firewall
    pub async fn set_enabled(
        &self,
        ctx: &Context,
        firewall_id: &str,
        enabled: bool,
    ) -> Result<FirewallDetail> {
        let action = if enabled { "enable" } else { "disable" };
        let path = format!("v2/firewalls/{}/{}", seg(firewall_id), action);
        self.client
            .put(ctx, Service::Firewall, &path, &serde_json::json!({}))
            .await
    }

    /// Turn traffic logging on or off
    ///
    /// Logging needs a log-storage bucket configured for the project; the API
    /// answers a bare 400 otherwise.
    pub async fn set_logging(
        &self,
        ctx: &Context,
        firewall_id: &str,
        loggable: bool,
    ) -> Result<FirewallDetail> {
        let path = format!("v2/firewalls/{}/logging", seg(firewall_id));
        let body = serde_json::json!({ "isLoggable": loggable });
        self.client.put(ctx, Service::Firewall, &path, &body).await
    }

    pub async fn create_rule(
        &self,
        ctx: &Context,
        firewall_id: &str,
        req: &FirewallRuleRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/firewalls/{}/rules", seg(firewall_id));
        self.client.post(ctx, Service::Firewall, &path, req).await
    }

    pub async fn get_rule(
        &self,
        ctx: &Context,
        firewall_id: &str,
        rule_id: &str,
    ) -> Result<FirewallRuleDetail> {
        let path = format!("v2/firewalls/{}/rules/{}", seg(firewall_id), seg(rule_id));
        self.client
            .get(ctx, Service::Firewall, &path, &Query::new())
            .await
    }

    pub async fn list_rules(
        &self,
        ctx: &Context,
        firewall_id: &str,
        page: Page,
    ) -> Result<ListResponse<FirewallRuleDetail>> {
        let path = format!("v2/firewalls/{}/rules", seg(firewall_id));
        self.client
            .get(ctx, Service::Firewall, &path, &Query::new().page(page))
            .await
    }

    pub async fn update_rule(
        &self,
        ctx: &Context,
        firewall_id: &str,
        rule_id: &str,
        req: &FirewallRuleRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/firewalls/{}/rules/{}", seg(firewall_id), seg(rule_id));
        self.client.put(ctx, Service::Firewall, &path, req).await
    }

    pub async fn delete_rule(
        &self,
        ctx: &Context,
        firewall_id: &str,
        rule_id: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/firewalls/{}/rules", seg(firewall_id));
        let body = serde_json::json!({
            "ruleDeletionType": "PARTIAL",
            "ruleIds": [rule_id],
        });
        self.client
            .delete_with_body(ctx, Service::Firewall, &path, &body)
            .await
    }
}
