//! Kubernetes engine resource
//!
//! The engine's zone is taken from its VPC. A removed engine answers 403 for
//! a while before the API settles on 404, so both count as deleted.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::resolver;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::kubernetes::{CreateKubernetesEngineRequest, KubernetesEngineDetail};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_kubernetes_engine";

pub(crate) const PRODUCT_GROUP: &str = "CONTAINER";
pub(crate) const TARGET_PRODUCT: &str = "Kubernetes Engine";

pub struct KubernetesEngine;

fn state_of(d: &KubernetesEngineDetail) -> Map<String, Value> {
    object(json!({
        "name": d.kubernetes_engine_name,
        "k8s_version": d.k8s_version,
        "vpc_id": d.vpc_id,
        "subnet_id": d.subnet_id,
        "security_group_id": d.security_group_id,
        "volume_id": d.volume_id,
        "cloud_logging_enabled": d.cloud_logging_enabled,
        "public_acl_ip_address": d.public_endpoint_access_control_ip,
        "public_endpoint_url": d.public_endpoint_url,
        "private_endpoint_url": d.private_endpoint_url,
        "node_pool_count": d.node_pool_count,
        "service_zone_id": d.service_zone_id,
        "state": d.kubernetes_engine_status,
        "created_dt": d.created_dt,
    }))
}

impl KubernetesEngine {
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
            let d = client.kubernetes().get_engine(ctx, id).await;
            d.map(|d| {
                let s = d.kubernetes_engine_status.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for KubernetesEngine {
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
                    .validate(validate::name_with_dash(3, 30)),
            ),
            (
                "k8s_version",
                Field::string()
                    .required()
                    .describe("Changing the version upgrades the control plane in place"),
            ),
            ("vpc_id", Field::string().required().force_new()),
            ("subnet_id", Field::string().required().force_new()),
            ("security_group_id", Field::string().required().force_new()),
            (
                "volume_id",
                Field::string()
                    .required()
                    .force_new()
                    .describe("File storage shared by the cluster"),
            ),
            (
                "cloud_logging_enabled",
                Field::bool().optional().force_new().default_value(false),
            ),
            (
                "public_acl_ip_address",
                Field::string()
                    .optional()
                    .validate(validate::ip_or_cidr())
                    .describe("Source allowed to reach the public endpoint"),
            ),
            ("public_endpoint_url", Field::string().computed()),
            ("private_endpoint_url", Field::string().computed()),
            ("node_pool_count", Field::int().computed()),
            ("service_zone_id", Field::string().computed()),
            ("state", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn gone_policy(&self) -> GonePolicy {
        GonePolicy::NotFoundOrForbidden
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let vpc = client.vpc().get(ctx, &data.get_string("vpc_id")).await?;
        let group_id = resolver::resolve_product_group(
            ctx,
            client,
            &vpc.service_zone_id,
            PRODUCT_GROUP,
            TARGET_PRODUCT,
        )
        .await?;

        let req = CreateKubernetesEngineRequest {
            kubernetes_engine_name: data.get_string("name"),
            k8s_version: data.get_string("k8s_version"),
            product_group_id: group_id,
            vpc_id: vpc.vpc_id,
            subnet_id: data.get_string("subnet_id"),
            security_group_id: data.get_string("security_group_id"),
            volume_id: data.get_string("volume_id"),
            zone_id: vpc.service_zone_id,
            cloud_logging_enabled: data.get_bool("cloud_logging_enabled"),
            public_endpoint_access_control_ip: data
                .get_str("public_acl_ip_address")
                .map(str::to_string),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.kubernetes().create_engine(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::RUNNING], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        if let Some(detail) = detail_or_gone(
            data,
            self.gone_policy(),
            client.kubernetes().get_engine(ctx, &id),
        )
        .await?
        {
            let mut fields = state_of(&detail);
            if detail.public_endpoint_access_control_ip.is_empty() {
                fields.remove("public_acl_ip_address");
            }
            data.set_map(fields);
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let timeout = self.timeouts().for_update(client);

        if data.has_change("k8s_version") {
            let version = data.get_string("k8s_version");
            tracing::info!("upgrading {} to {}", id, version);
            client.kubernetes().upgrade_engine(ctx, &id, &version).await?;
            self.wait(ctx, client, &id, &[state::UPGRADING], &[state::RUNNING], timeout)
                .await?;
        }

        if data.has_change("public_acl_ip_address") {
            client
                .kubernetes()
                .update_public_acl(ctx, &id, &data.get_string("public_acl_ip_address"))
                .await?;
            self.wait(ctx, client, &id, &[state::EDITING], &[state::RUNNING], timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.kubernetes().delete_engine(ctx, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::RUNNING, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, _args: &ResourceData) -> Result<Vec<Value>> {
        let resp = all_pages(|page| async move {
            client.kubernetes().list_engines(ctx, None, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.kubernetes_engine_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    #[test]
    fn test_forbidden_counts_as_gone() {
        assert_eq!(KubernetesEngine.gone_policy(), GonePolicy::NotFoundOrForbidden);
    }

    #[test]
    fn test_version_updates_in_place() {
        let schema = KubernetesEngine.schema();
        assert!(!schema["k8s_version"].force_new);
        assert!(schema["vpc_id"].force_new);
    }

    #[test]
    fn test_acl_must_be_address() {
        let diags = testing::validate(
            KubernetesEngine,
            json!({
                "name": "k8s-1",
                "k8s_version": "v1.24.8",
                "vpc_id": "VPC-1",
                "subnet_id": "SUBNET-1",
                "security_group_id": "FW-SG-1",
                "volume_id": "FS-1",
                "public_acl_ip_address": "anywhere",
            }),
        );
        assert!(diags.to_string().contains("public_acl_ip_address"));
    }
}
