//! Firewall rule resource
//!
//! Rules are a sub-collection of one firewall. Concurrent edits of the same
//! firewall make the API answer 409, so every mutation holds the firewall's
//! entry in [`firewall_locks`] from the submit until the rule has converged.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::lock::firewall_locks;
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, Diagnostics, Field, ResourceData, Schema, Type};
use crate::scp::{all_pages, ScpClient};
use crate::service::firewall::{FirewallRuleDetail, FirewallRuleRequest, RuleService};
use crate::validate;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_firewall_rule";

pub const DIRECTIONS: &[&str] = &["IN", "OUT"];
pub const ACTIONS: &[&str] = &["ALLOW", "DROP"];
pub const PROTOCOLS: &[&str] = &["TCP", "UDP", "ICMP", "ALL"];

pub struct FirewallRule;

#[derive(Debug, Deserialize)]
struct ServiceBlock {
    protocol: String,
    #[serde(default)]
    port: String,
}

fn state_of(d: &FirewallRuleDetail) -> Map<String, Value> {
    let services: Vec<Value> = d
        .services
        .iter()
        .map(|s| json!({"protocol": s.service_type, "port": s.service_value}))
        .collect();
    object(json!({
        "direction": d.rule_direction,
        "action": d.rule_action,
        "description": d.rule_description,
        "enabled": d.is_rule_enabled,
        "source_addresses": d.source_ip_addresses,
        "destination_addresses": d.destination_ip_addresses,
        "service": services,
        "name": d.rule_name,
        "state": d.rule_state,
    }))
}

fn request(data: &ResourceData) -> Result<FirewallRuleRequest> {
    let services: Vec<ServiceBlock> = data.decode_field("service")?.unwrap_or_default();
    let strings = |key: &str| -> Vec<String> {
        data.get_list(key)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    };
    Ok(FirewallRuleRequest {
        rule_direction: data.get_string("direction"),
        rule_action: data.get_string("action"),
        rule_description: data.get_string("description"),
        is_rule_enabled: data.get_bool("enabled"),
        source_ip_addresses: strings("source_addresses"),
        destination_ip_addresses: strings("destination_addresses"),
        services: services
            .into_iter()
            .map(|s| RuleService {
                service_type: s.protocol,
                service_value: s.port,
            })
            .collect(),
    })
}

impl FirewallRule {
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        firewall_id: &str,
        rule_id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        let waiter = waiter(TYPE, rule_id, pending, target, timeout);
        converge(ctx, waiter, GonePolicy::NotFound, || async move {
            let d = client.firewall().get_rule(ctx, firewall_id, rule_id).await;
            d.map(|d| {
                let s = d.rule_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for FirewallRule {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        let addresses = || {
            Field::list_of(Type::String)
                .required()
                .min_items(1)
                .validate(validate::each(validate::ip_or_cidr()))
        };
        schema([
            ("firewall_id", Field::string().required().force_new()),
            (
                "direction",
                Field::string()
                    .required()
                    .validate(validate::string_in(DIRECTIONS)),
            ),
            (
                "action",
                Field::string()
                    .required()
                    .validate(validate::string_in(ACTIONS)),
            ),
            ("source_addresses", addresses()),
            ("destination_addresses", addresses()),
            (
                "service",
                Field::set_block(schema([
                    (
                        "protocol",
                        Field::string()
                            .required()
                            .validate(validate::string_in(PROTOCOLS)),
                    ),
                    (
                        "port",
                        Field::string()
                            .optional()
                            .validate(validate::port_spec()),
                    ),
                ]))
                .required()
                .min_items(1),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("enabled", Field::bool().optional().default_value(true)),
            ("name", Field::string().computed()),
            ("state", Field::string().computed()),
        ])
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Ok(Some(services)) = data.decode_field::<Vec<ServiceBlock>>("service") else {
            return diags;
        };
        for (i, s) in services.iter().enumerate() {
            let needs_port = s.protocol == "TCP" || s.protocol == "UDP";
            let path = crate::schema::AttributePath::root()
                .key("service")
                .index(i)
                .key("port");
            if needs_port && s.port.is_empty() {
                diags.error(&path, format!("{} services need a port", s.protocol));
            } else if !needs_port && !s.port.is_empty() && s.port != "ALL" {
                diags.error(&path, format!("{} services take no port", s.protocol));
            }
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let firewall_id = data.get_string("firewall_id");
        let req = request(data)?;
        let _guard = firewall_locks().lock(&firewall_id).await;

        let ack = client.firewall().create_rule(ctx, &firewall_id, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(
            ctx,
            client,
            &firewall_id,
            &id,
            &[state::CREATING, state::DEPLOYING],
            &[state::ACTIVE],
            timeout,
        )
        .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let firewall_id = data.get_string("firewall_id");
        if let Some(detail) = detail_or_gone(
            data,
            self.gone_policy(),
            client.firewall().get_rule(ctx, &firewall_id, &id),
        )
        .await?
        {
            data.set_map(state_of(&detail));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let changed = [
            "direction",
            "action",
            "source_addresses",
            "destination_addresses",
            "service",
            "description",
            "enabled",
        ]
        .iter()
        .any(|k| data.has_change(k));
        if !changed {
            return Ok(());
        }

        let id = data.id().to_string();
        let firewall_id = data.get_string("firewall_id");
        let req = request(data)?;
        let _guard = firewall_locks().lock(&firewall_id).await;

        client
            .firewall()
            .update_rule(ctx, &firewall_id, &id, &req)
            .await?;
        let timeout = self.timeouts().for_update(client);
        self.wait(
            ctx,
            client,
            &firewall_id,
            &id,
            &[state::EDITING, state::DEPLOYING],
            &[state::ACTIVE],
            timeout,
        )
        .await
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let firewall_id = data.get_string("firewall_id");
        let _guard = firewall_locks().lock(&firewall_id).await;

        client.firewall().delete_rule(ctx, &firewall_id, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &firewall_id,
            &id,
            &[state::ACTIVE, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    fn list_schema(&self) -> Schema {
        schema([("firewall_id", Field::string().required())])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let firewall_id = args.get_string("firewall_id");
        let fw = firewall_id.as_str();
        let resp = all_pages(|page| async move {
            client.firewall().list_rules(ctx, fw, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| {
                let mut state = state_of(d);
                state.insert("firewall_id".to_string(), Value::String(firewall_id.clone()));
                with_id(state, &d.rule_id)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    fn config(services: Value) -> Value {
        json!({
            "firewall_id": "FW-1",
            "direction": "IN",
            "action": "ALLOW",
            "source_addresses": ["10.0.0.0/24"],
            "destination_addresses": ["192.168.0.10"],
            "service": services,
        })
    }

    #[test]
    fn test_valid_rule() {
        let diags = testing::validate(FirewallRule, config(json!([{"protocol": "TCP", "port": "443"}])));
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_tcp_needs_port_icmp_takes_none() {
        let diags = testing::validate(FirewallRule, config(json!([{"protocol": "TCP"}])));
        assert!(diags.to_string().contains("service.0.port"));
        let diags = testing::validate(FirewallRule, config(json!([{"protocol": "ICMP", "port": "22"}])));
        assert!(diags.to_string().contains("take no port"));
    }

    #[test]
    fn test_request_from_data() {
        let data = testing::data(
            &FirewallRule,
            None,
            Some(config(json!([{"protocol": "UDP", "port": "53"}]))),
        );
        let req = request(&data).unwrap();
        assert_eq!(req.rule_direction, "IN");
        assert_eq!(req.services[0].service_type, "UDP");
        assert_eq!(req.services[0].service_value, "53");
        assert_eq!(req.destination_ip_addresses, vec!["192.168.0.10"]);
    }
}
