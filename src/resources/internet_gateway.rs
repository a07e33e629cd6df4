//! Internet gateway resource
//!
//! Creating a gateway also creates its firewall. The firewall's enabled and
//! logging switches are exposed on the gateway and changed through the
//! firewall service.

use super::{converge, object};
use crate::context::Context;
use crate::error::{Error, GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, Diagnostics, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::firewall::{FirewallDetail, ListFirewalls};
use crate::service::internet_gateway::{CreateInternetGatewayRequest, InternetGatewayDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_internet_gateway";

pub const GATEWAY_TYPES: &[&str] = &["SHARED", "DEDICATED"];

pub struct InternetGateway;

fn state_of(d: &InternetGatewayDetail) -> Map<String, Value> {
    object(json!({
        "name": d.internet_gateway_name,
        "vpc_id": d.vpc_id,
        "type": d.internet_gateway_type,
        "description": d.internet_gateway_description,
        "state": d.internet_gateway_state,
        "service_zone_id": d.service_zone_id,
        "created_dt": d.created_dt,
    }))
}

fn firewall_state(fw: &FirewallDetail) -> Map<String, Value> {
    object(json!({
        "firewall_id": fw.firewall_id,
        "firewall_enabled": fw.firewall_state == state::ACTIVE,
        "firewall_logging": fw.is_loggable,
    }))
}

/// Firewall created for `gateway_id`, if the gateway has one
async fn find_firewall(ctx: &Context, client: &ScpClient, gateway_id: &str) -> Result<Option<FirewallDetail>> {
    let opts = ListFirewalls {
        object_id: Some(gateway_id),
        ..Default::default()
    };
    let resp = all_pages(|page| async move {
        client.firewall().list(ctx, &ListFirewalls { page, ..opts }).await
    })
    .await?;
    Ok(resp.contents.into_iter().find(|f| f.object_id == gateway_id))
}

impl InternetGateway {
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        converge(ctx, waiter(TYPE, id, pending, target, timeout), GonePolicy::NotFound, || async move {
            let d = client.internet_gateway().get(ctx, id).await;
            d.map(|d| {
                let s = d.internet_gateway_state.clone();
                (d, s)
            })
        })
        .await
    }

    async fn wait_firewall(
        &self,
        ctx: &Context,
        client: &ScpClient,
        firewall_id: &str,
        target: &str,
        timeout: Duration,
    ) -> Result<()> {
        let pending = [state::EDITING, state::DEPLOYING];
        let waiter = waiter("firewall", firewall_id, &pending, &[target], timeout);
        converge(ctx, waiter, GonePolicy::NotFound, || async move {
            let fw = client.firewall().get(ctx, firewall_id).await;
            fw.map(|fw| {
                let s = fw.firewall_state.clone();
                (fw, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for InternetGateway {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            ("vpc_id", Field::string().required().force_new()),
            (
                "type",
                Field::string()
                    .optional()
                    .force_new()
                    .default_value("SHARED")
                    .validate(validate::string_in(GATEWAY_TYPES)),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            (
                "firewall_enabled",
                Field::bool().optional().default_value(true),
            ),
            (
                "firewall_logging",
                Field::bool()
                    .optional()
                    .default_value(false)
                    .describe("Requires a log-storage bucket configured for the project"),
            ),
            ("name", Field::string().computed()),
            ("state", Field::string().computed()),
            ("firewall_id", Field::string().computed()),
            ("service_zone_id", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let enabled = data
            .get("firewall_enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if data.get_bool("firewall_logging") && !enabled {
            diags.error(
                &"firewall_logging".into(),
                "logging needs the firewall to be enabled",
            );
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let req = CreateInternetGatewayRequest {
            vpc_id: data.get_string("vpc_id"),
            internet_gateway_type: data.get_string("type"),
            internet_gateway_description: data.get_string("description"),
            firewall_enabled: data.get_bool("firewall_enabled"),
            firewall_loggable: data.get_bool("firewall_logging"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.internet_gateway().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.internet_gateway().get(ctx, &id)).await?
        else {
            return Ok(());
        };
        data.set_map(state_of(&detail));
        if let Some(fw) = find_firewall(ctx, client, &id).await? {
            data.set_map(firewall_state(&fw));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let timeout = self.timeouts().for_update(client);

        if data.has_change("description") {
            client
                .internet_gateway()
                .update_description(ctx, &id, &data.get_string("description"))
                .await?;
            self.wait(ctx, client, &id, &[state::EDITING], &[state::ACTIVE], timeout)
                .await?;
        }

        if data.has_change("firewall_enabled") || data.has_change("firewall_logging") {
            let fw = find_firewall(ctx, client, &id)
                .await?
                .ok_or_else(|| Error::Precondition(format!("internet gateway {} has no firewall", id)))?;

            // logging can only change on an enabled firewall, so order the calls
            let enabled = data.get_bool("firewall_enabled");
            if enabled && data.has_change("firewall_enabled") {
                client.firewall().set_enabled(ctx, &fw.firewall_id, true).await?;
                self.wait_firewall(ctx, client, &fw.firewall_id, state::ACTIVE, timeout)
                    .await?;
            }
            if data.has_change("firewall_logging") {
                client
                    .firewall()
                    .set_logging(ctx, &fw.firewall_id, data.get_bool("firewall_logging"))
                    .await?;
            }
            if !enabled && data.has_change("firewall_enabled") {
                client.firewall().set_enabled(ctx, &fw.firewall_id, false).await?;
                self.wait_firewall(ctx, client, &fw.firewall_id, state::INACTIVE, timeout)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.internet_gateway().delete(ctx, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::ACTIVE, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    fn list_schema(&self) -> Schema {
        schema([("vpc_id", Field::string().optional())])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let vpc_id = args.get_str("vpc_id");
        let resp = all_pages(|page| async move {
            client.internet_gateway().list(ctx, vpc_id, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.internet_gateway_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    #[test]
    fn test_logging_requires_enabled_firewall() {
        let diags = testing::validate(
            InternetGateway,
            json!({"vpc_id": "VPC-1", "firewall_enabled": false, "firewall_logging": true}),
        );
        assert!(diags.to_string().contains("firewall_logging"));
        let diags = testing::validate(InternetGateway, json!({"vpc_id": "VPC-1", "firewall_logging": true}));
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_firewall_state_maps_enabled() {
        let fw = FirewallDetail {
            firewall_id: "FW-1".into(),
            firewall_state: "INACTIVE".into(),
            is_loggable: true,
            ..Default::default()
        };
        let state = firewall_state(&fw);
        assert_eq!(state["firewall_enabled"], false);
        assert_eq!(state["firewall_logging"], true);
    }
}
