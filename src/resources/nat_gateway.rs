//! NAT gateway resource
//!
//! The detail call only reports the gateway's IP address; the matching public
//! IP is looked up by that address to fill `public_ipv4`.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::nat_gateway::{CreateNatGatewayRequest, NatGatewayDetail};
use crate::service::public_ip::ListPublicIps;
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_nat_gateway";

pub struct NatGateway;

fn state_of(d: &NatGatewayDetail) -> Map<String, Value> {
    object(json!({
        "name": d.nat_gateway_name,
        "subnet_id": d.subnet_id,
        "public_ip_id": d.public_ip_address_id,
        "description": d.nat_gateway_description,
        "state": d.nat_gateway_state,
        "vpc_id": d.vpc_id,
        "created_dt": d.created_dt,
    }))
}

/// Address of the public IP holding `ip_address`, empty if none matches
async fn public_ipv4(ctx: &Context, client: &ScpClient, ip_address: &str) -> Result<String> {
    if ip_address.is_empty() {
        return Ok(String::new());
    }
    let opts = ListPublicIps {
        ip_address: Some(ip_address),
        ..Default::default()
    };
    let resp = all_pages(|page| async move {
        client.public_ip().list(ctx, &ListPublicIps { page, ..opts }).await
    })
    .await?;
    Ok(resp
        .contents
        .into_iter()
        .find(|ip| ip.ip_address == ip_address)
        .map(|ip| ip.ip_address)
        .unwrap_or_default())
}

impl NatGateway {
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
            let d = client.nat_gateway().get(ctx, id).await;
            d.map(|d| {
                let s = d.nat_gateway_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for NatGateway {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            ("subnet_id", Field::string().required().force_new()),
            (
                "public_ip_id",
                Field::string()
                    .required()
                    .force_new()
                    .describe("Reserved public IP used for outbound traffic"),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("name", Field::string().computed()),
            ("public_ipv4", Field::string().computed()),
            ("state", Field::string().computed()),
            ("vpc_id", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let req = CreateNatGatewayRequest {
            subnet_id: data.get_string("subnet_id"),
            public_ip_address_id: data.get_string("public_ip_id"),
            nat_gateway_description: data.get_string("description"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.nat_gateway().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.nat_gateway().get(ctx, &id)).await?
        else {
            return Ok(());
        };
        data.set_map(state_of(&detail));
        let address = public_ipv4(ctx, client, &detail.nat_gateway_ip_address).await?;
        data.set("public_ipv4", address);
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        if data.has_change("description") {
            let id = data.id().to_string();
            client
                .nat_gateway()
                .update_description(ctx, &id, &data.get_string("description"))
                .await?;
            let timeout = self.timeouts().for_update(client);
            self.wait(ctx, client, &id, &[state::EDITING], &[state::ACTIVE], timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.nat_gateway().delete(ctx, &id).await?;
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
            client.nat_gateway().list(ctx, vpc_id, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| {
                let mut state = state_of(d);
                state.insert(
                    "public_ipv4".to_string(),
                    Value::String(d.nat_gateway_ip_address.clone()),
                );
                with_id(state, &d.nat_gateway_id)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    #[test]
    fn test_public_ipv4_is_computed() {
        let diags = testing::validate(
            NatGateway,
            json!({"subnet_id": "sn-x", "public_ip_id": "pip-1", "public_ipv4": "1.1.1.1"}),
        );
        assert!(diags.to_string().contains("public_ipv4"));
    }

    #[test]
    fn test_state_of_maps_public_ip_id() {
        let d = NatGatewayDetail {
            nat_gateway_id: "NAT-1".into(),
            public_ip_address_id: "pip-1".into(),
            subnet_id: "sn-x".into(),
            ..Default::default()
        };
        let state = state_of(&d);
        assert_eq!(state["public_ip_id"], "pip-1");
        assert_eq!(state["subnet_id"], "sn-x");
    }
}
