//! VPC direct connect resource
//!
//! Peers a requester VPC with an approver VPC, possibly owned by another
//! project. Once the peering is removed on either side the API answers 403
//! instead of 404, so both count as gone.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::vpc::{CreateVpcDcRequest, VpcDcDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_vpc_dc";

/// Peering state until the approver accepts
const REQUESTING: &str = "REQUESTING";

pub struct VpcDc;

fn state_of(d: &VpcDcDetail) -> Map<String, Value> {
    object(json!({
        "name": d.vpc_dc_name,
        "description": d.vpc_dc_description,
        "state": d.vpc_dc_state,
        "requester_vpc_id": d.requester_vpc_id,
        "requester_project_id": d.requester_project_id,
        "approver_vpc_id": d.approver_vpc_id,
        "approver_project_id": d.approver_project_id,
    }))
}

impl VpcDc {
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        converge(ctx, waiter(TYPE, id, pending, target, timeout), self.gone_policy(), || async move {
            let d = client.vpc().get_dc(ctx, id).await;
            d.map(|d| {
                let s = d.vpc_dc_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for VpcDc {
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
            ("requester_vpc_id", Field::string().required().force_new()),
            ("approver_vpc_id", Field::string().required().force_new()),
            (
                "approver_project_id",
                Field::string()
                    .optional()
                    .computed()
                    .force_new()
                    .describe("Project owning the approver VPC; defaults to the provider's project"),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("state", Field::string().computed()),
            ("requester_project_id", Field::string().computed()),
            ("requester_vpc_name", Field::string().computed()),
            ("approver_vpc_name", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn gone_policy(&self) -> GonePolicy {
        GonePolicy::NotFoundOrForbidden
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let approver_project_id = data
            .get_str("approver_project_id")
            .unwrap_or(client.project_id())
            .to_string();
        let req = CreateVpcDcRequest {
            vpc_dc_name: data.get_string("name"),
            vpc_dc_description: data.get_string("description"),
            requester_vpc_id: data.get_string("requester_vpc_id"),
            approver_vpc_id: data.get_string("approver_vpc_id"),
            approver_project_id,
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.vpc().create_dc(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::CREATING, REQUESTING],
            &[state::ACTIVE],
            timeout,
        )
        .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.vpc().get_dc(ctx, &id)).await?
        else {
            return Ok(());
        };
        data.set_map(state_of(&detail));

        // each side is looked up on its own; the approver VPC may live in
        // another project and be invisible, which leaves its name empty
        let requester = client.vpc().get(ctx, &detail.requester_vpc_id).await?;
        data.set("requester_vpc_name", requester.vpc_name);
        let approver_name = match client.vpc().get(ctx, &detail.approver_vpc_id).await {
            Ok(vpc) => vpc.vpc_name,
            Err(e) if e.is_deleted_equivalent(GonePolicy::NotFoundOrForbidden) => String::new(),
            Err(e) => return Err(e),
        };
        data.set("approver_vpc_name", approver_name);
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        if data.has_change("description") {
            let id = data.id().to_string();
            client
                .vpc()
                .update_dc_description(ctx, &id, &data.get_string("description"))
                .await?;
            let timeout = self.timeouts().for_update(client);
            self.wait(ctx, client, &id, &[state::EDITING], &[state::ACTIVE], timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.vpc().delete_dc(ctx, &id).await?;
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
        schema([("requester_vpc_id", Field::string().optional())])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let requester = args.get_str("requester_vpc_id");
        let resp = all_pages(|page| async move {
            client.vpc().list_dcs(ctx, requester, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.vpc_dc_id))
            .collect())
    }
}
