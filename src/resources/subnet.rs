//! Subnet resource

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, suppress_case, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::subnet::{CreateSubnetRequest, ListSubnets, SubnetDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_subnet";

pub const SUBNET_TYPES: &[&str] = &["PUBLIC", "PRIVATE", "BM"];

pub struct Subnet;

fn state_of(d: &SubnetDetail) -> Map<String, Value> {
    object(json!({
        "name": d.subnet_name,
        "vpc_id": d.vpc_id,
        "cidr_block": d.subnet_cidr_block,
        "type": d.subnet_type,
        "description": d.subnet_description,
        "state": d.subnet_state,
        "gateway_ip": d.subnet_gateway_ip_address,
        "created_dt": d.created_dt,
    }))
}

impl Subnet {
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
            let d = client.subnet().get(ctx, id).await;
            d.map(|d| {
                let s = d.subnet_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for Subnet {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            (
                "name",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::name_with_dash(3, 20)),
            ),
            ("vpc_id", Field::string().required().force_new()),
            (
                "cidr_block",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::cidr_prefix_between(16, 28))
                    .describe("IPv4 CIDR between /16 and /28"),
            ),
            (
                "type",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::string_in(SUBNET_TYPES))
                    .suppress(suppress_case),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("state", Field::string().computed()),
            ("gateway_ip", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let req = CreateSubnetRequest {
            subnet_name: data.get_string("name"),
            subnet_cidr_block: data.get_string("cidr_block"),
            subnet_type: data.get_string("type").to_uppercase(),
            vpc_id: data.get_string("vpc_id"),
            subnet_description: data.get_string("description"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.subnet().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        if let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.subnet().get(ctx, &id)).await?
        {
            data.set_map(state_of(&detail));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        if data.has_change("description") {
            let id = data.id().to_string();
            client
                .subnet()
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
        client.subnet().delete(ctx, &id).await?;
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
        let opts = ListSubnets {
            vpc_id: args.get_str("vpc_id"),
            ..Default::default()
        };
        let resp = all_pages(|page| async move {
            client.subnet().list(ctx, &ListSubnets { page, ..opts }).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.subnet_id))
            .collect())
    }
}
