//! Public IP resource
//!
//! A reserved address becomes `ATTACHED` once a gateway or server uses it;
//! both count as converged.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::resolver;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::public_ip::{CreatePublicIpRequest, ListPublicIps, PublicIpDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_public_ip";

pub const UPLINK_TYPES: &[&str] = &[
    "INTERNET",
    "DEDICATED_INTERNET",
    "SHARED_GROUP",
    "SECURE_INTERNET",
];

const SETTLED: &[&str] = &[state::RESERVED, state::ATTACHED];

pub struct PublicIp;

fn state_of(d: &PublicIpDetail) -> Map<String, Value> {
    object(json!({
        "uplink_type": d.uplink_type,
        "description": d.public_ip_description,
        "ip_address": d.ip_address,
        "state": d.public_ip_state,
        "service_zone_id": d.service_zone_id,
        "attached_object_name": d.attached_object_name,
    }))
}

impl PublicIp {
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
            let d = client.public_ip().get(ctx, id).await;
            d.map(|d| {
                let s = d.public_ip_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for PublicIp {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            ("region", Field::string().required().force_new()),
            (
                "uplink_type",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::string_in(UPLINK_TYPES)),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            ("ip_address", Field::string().computed()),
            ("state", Field::string().computed()),
            ("service_zone_id", Field::string().computed()),
            ("attached_object_name", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let zone_id = resolver::resolve_zone(ctx, client, &data.get_string("region")).await?;
        let req = CreatePublicIpRequest {
            service_zone_id: zone_id,
            uplink_type: data.get_string("uplink_type"),
            public_ip_description: data.get_string("description"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.public_ip().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], SETTLED, timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.public_ip().get(ctx, &id)).await?
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
                .public_ip()
                .update_description(ctx, &id, &data.get_string("description"))
                .await?;
            let timeout = self.timeouts().for_update(client);
            self.wait(ctx, client, &id, &[state::EDITING], SETTLED, timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.public_ip().delete(ctx, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::RESERVED, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, _args: &ResourceData) -> Result<Vec<Value>> {
        let resp = all_pages(|page| async move {
            client
                .public_ip()
                .list(ctx, &ListPublicIps { page, ..Default::default() })
                .await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.public_ip_address_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    #[test]
    fn test_uplink_type_enum() {
        for uplink in UPLINK_TYPES {
            let diags = testing::validate(PublicIp, json!({"region": "KR-WEST-1", "uplink_type": uplink}));
            assert!(diags.is_empty(), "{}: {}", uplink, diags);
        }
        let diags = testing::validate(PublicIp, json!({"region": "KR-WEST-1", "uplink_type": "LEASED"}));
        assert!(diags.to_string().contains("uplink_type"));
    }

    #[test]
    fn test_ip_address_is_computed() {
        let diags = testing::validate(
            PublicIp,
            json!({"region": "KR-WEST-1", "uplink_type": "INTERNET", "ip_address": "1.2.3.4"}),
        );
        assert!(diags.has_errors());
    }
}
