//! VPC resource

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::resolver;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::vpc::{CreateVpcRequest, ListVpcs, VpcDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_vpc";

pub struct Vpc;

fn state_of(d: &VpcDetail) -> Map<String, Value> {
    object(json!({
        "name": d.vpc_name,
        "description": d.vpc_description,
        "state": d.vpc_state,
        "service_zone_id": d.service_zone_id,
        "created_by": d.created_by,
        "created_dt": d.created_dt,
    }))
}

impl Vpc {
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
            let d = client.vpc().get(ctx, id).await;
            d.map(|d| {
                let s = d.vpc_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for Vpc {
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
                    .validate(validate::name_with_dash(3, 20))
                    .describe("VPC name"),
            ),
            (
                "region",
                Field::string().required().force_new().describe("Region name, e.g. KR-WEST-1"),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("state", Field::string().computed()),
            ("service_zone_id", Field::string().computed()),
            ("created_by", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let zone_id = resolver::resolve_zone(ctx, client, &data.get_string("region")).await?;
        let req = CreateVpcRequest {
            vpc_name: data.get_string("name"),
            vpc_description: data.get_string("description"),
            service_zone_id: zone_id,
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.vpc().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) = detail_or_gone(data, self.gone_policy(), client.vpc().get(ctx, &id)).await?
        else {
            return Ok(());
        };
        data.set_map(state_of(&detail));
        if data.get_str("region").is_none() {
            let region = resolver::zone_location(ctx, client, &detail.service_zone_id).await?;
            data.set("region", region);
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        if data.has_change("description") {
            let id = data.id().to_string();
            client
                .vpc()
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
        client.vpc().delete(ctx, &id).await?;
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

    async fn list(&self, ctx: &Context, client: &ScpClient, _args: &ResourceData) -> Result<Vec<Value>> {
        let resp = all_pages(|page| async move {
            client.vpc().list(ctx, &ListVpcs { page, ..Default::default() }).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.vpc_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    #[test]
    fn test_name_validation() {
        let diags = testing::validate(Vpc, json!({"name": "1bad-", "region": "KR-WEST-1"}));
        assert!(diags.to_string().contains("name"));
        let diags = testing::validate(Vpc, json!({"name": "vpc01", "region": "KR-WEST-1"}));
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_state_of_detail() {
        let d = VpcDetail {
            vpc_id: "VPC-1".into(),
            vpc_name: "vpc01".into(),
            vpc_state: "ACTIVE".into(),
            service_zone_id: "ZONE-1".into(),
            ..Default::default()
        };
        let state = with_id(state_of(&d), &d.vpc_id);
        assert_eq!(state["id"], "VPC-1");
        assert_eq!(state["name"], "vpc01");
        assert_eq!(state["service_zone_id"], "ZONE-1");
    }

    #[test]
    fn test_name_and_region_force_new() {
        let s = Vpc.schema();
        assert!(s["name"].force_new);
        assert!(s["region"].force_new);
        assert!(!s["description"].force_new);
    }
}
