//! Block storage resource
//!
//! Size, name and encryption are fixed once the disk exists; changing them is
//! rejected at plan time instead of replacing a disk that holds data. The
//! attached server is the one mutable property.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::resolver;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::block_storage::{BlockStorageDetail, CreateBlockStorageRequest};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_block_storage";

const PRODUCT_GROUP: &str = "STORAGE";
const TARGET_PRODUCT: &str = "Block Storage";
const PRODUCT_TYPE_DISK: &str = "DISK";

const ATTACHING: &str = "ATTACHING";
const DETACHING: &str = "DETACHING";

pub const DISK_TYPES: &[&str] = &["SSD", "HDD"];

pub struct BlockStorage;

fn state_of(d: &BlockStorageDetail) -> Map<String, Value> {
    object(json!({
        "name": d.block_storage_name,
        "storage_size_gb": d.block_storage_size,
        "encrypted": d.encrypt_enabled,
        "disk_type": d.disk_type,
        "virtual_server_id": d.virtual_server_id,
        "product_id": d.product_id,
        "service_zone_id": d.service_zone_id,
        "state": d.block_storage_state,
        "created_dt": d.created_dt,
    }))
}

impl BlockStorage {
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
            let d = client.block_storage().get(ctx, id).await;
            d.map(|d| {
                let s = d.block_storage_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for BlockStorage {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            (
                "name",
                Field::string()
                    .required()
                    .immutable()
                    .validate(validate::alphanumeric_name(3, 28)),
            ),
            ("region", Field::string().required().force_new()),
            (
                "storage_size_gb",
                Field::int()
                    .required()
                    .immutable()
                    .validate(validate::int_between(10, 7168)),
            ),
            (
                "encrypted",
                Field::bool().optional().immutable().default_value(false),
            ),
            (
                "disk_type",
                Field::string()
                    .optional()
                    .force_new()
                    .default_value("SSD")
                    .validate(validate::string_in(DISK_TYPES)),
            ),
            (
                "virtual_server_id",
                Field::string()
                    .required()
                    .describe("Server the disk is attached to"),
            ),
            ("product_id", Field::string().computed()),
            ("service_zone_id", Field::string().computed()),
            ("state", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let zone_id = resolver::resolve_zone(ctx, client, &data.get_string("region")).await?;
        let group_id =
            resolver::resolve_product_group(ctx, client, &zone_id, PRODUCT_GROUP, TARGET_PRODUCT).await?;
        let product_id = resolver::resolve_product(
            ctx,
            client,
            &group_id,
            PRODUCT_TYPE_DISK,
            &data.get_string("disk_type"),
        )
        .await?;

        let req = CreateBlockStorageRequest {
            block_storage_name: data.get_string("name"),
            bs_size: data.get_i64("storage_size_gb").unwrap_or_default(),
            encrypt_enabled: data.get_bool("encrypted"),
            product_id,
            virtual_server_id: data.get_string("virtual_server_id"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.block_storage().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING, ATTACHING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.block_storage().get(ctx, &id)).await?
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
        if !data.has_change("virtual_server_id") {
            return Ok(());
        }
        let id = data.id().to_string();
        let timeout = self.timeouts().for_update(client);
        let (old, new) = data.get_change("virtual_server_id");
        let old = old.and_then(Value::as_str).map(str::to_string);
        let new = new.and_then(Value::as_str).map(str::to_string);

        if let Some(old) = old {
            tracing::info!("detaching {} from {}", id, old);
            client.block_storage().detach(ctx, &id, &old).await?;
            self.wait(ctx, client, &id, &[DETACHING], &[state::ACTIVE], timeout)
                .await?;
        }
        if let Some(new) = new {
            tracing::info!("attaching {} to {}", id, new);
            client.block_storage().attach(ctx, &id, &new).await?;
            self.wait(ctx, client, &id, &[ATTACHING], &[state::ACTIVE], timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.block_storage().delete(ctx, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::ACTIVE, DETACHING, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    fn list_schema(&self) -> Schema {
        schema([("virtual_server_id", Field::string().optional())])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let server_id = args.get_str("virtual_server_id");
        let resp = all_pages(|page| async move {
            client.block_storage().list(ctx, server_id, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.block_storage_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::ResourceEntry;
    use std::sync::Arc;

    fn prior() -> Value {
        json!({
            "id": "BS-1",
            "name": "disk1",
            "region": "KR-WEST-1",
            "storage_size_gb": 100,
            "encrypted": false,
            "disk_type": "SSD",
            "virtual_server_id": "VS-1",
        })
    }

    #[test]
    fn test_immutable_fields_rejected_at_plan() {
        let entry = ResourceEntry::new(Arc::new(BlockStorage));
        for (key, value) in [
            ("name", json!("disk2")),
            ("storage_size_gb", json!(200)),
            ("encrypted", json!(true)),
        ] {
            let mut proposed = prior();
            proposed[key] = value;
            let plan = entry.plan(Some(&prior()), Some(&proposed));
            assert!(plan.diagnostics.has_errors(), "{}", key);
            assert!(plan.diagnostics.to_string().contains(key));
        }
    }

    #[test]
    fn test_attach_target_updates_in_place() {
        let entry = ResourceEntry::new(Arc::new(BlockStorage));
        let mut proposed = prior();
        proposed["virtual_server_id"] = json!("VS-2");
        let plan = entry.plan(Some(&prior()), Some(&proposed));
        assert!(!plan.diagnostics.has_errors(), "{}", plan.diagnostics);
        assert!(!plan.requires_replace());
    }

    #[test]
    fn test_size_bounds() {
        let mut config = prior();
        config["storage_size_gb"] = json!(5);
        let diags = crate::resources::testing::validate(BlockStorage, config);
        assert!(diags.to_string().contains("storage_size_gb"));
    }
}
