//! Kubernetes node pool resource
//!
//! The node shape is given as cpu count and memory size and resolved to a
//! scale product of the engine's product group. Node provisioning is slow,
//! so every operation gets a 40 minute window.

use super::kubernetes_engine::{PRODUCT_GROUP, TARGET_PRODUCT};
use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource, Timeouts};
use crate::resolver;
use crate::schema::{schema, AttributePath, Diagnostics, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::kubernetes::{CreateNodePoolRequest, NodePoolDetail, NodePoolScaleRequest};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_kubernetes_node_pool";

const SCALING: &str = "SCALING";

const NODE_POOL_TIMEOUT: Duration = Duration::from_secs(40 * 60);

pub struct KubernetesNodePool;

fn state_of(d: &NodePoolDetail) -> Map<String, Value> {
    let mut state = object(json!({
        "engine_id": d.kubernetes_engine_id,
        "name": d.node_pool_name,
        "cpu_count": d.cpu_count,
        "memory_size_gb": d.memory_size,
        "storage_size_gb": d.storage_size,
        "image_id": d.image_id,
        "auto_scale": d.auto_scale,
        "auto_recovery": d.auto_recovery,
        "desired_node_count": d.desired_node_count,
        "min_node_count": d.min_node_count,
        "max_node_count": d.max_node_count,
        "scale_id": d.scale_id,
        "k8s_version": d.k8s_version,
        "state": d.node_pool_state,
    }));
    // bounds are reported as 0 when autoscaling is off
    if !d.auto_scale {
        state.remove("min_node_count");
        state.remove("max_node_count");
    }
    state
}

fn scale_request(data: &ResourceData) -> NodePoolScaleRequest {
    let auto_scale = data.get_bool("auto_scale");
    NodePoolScaleRequest {
        auto_scale,
        desired_node_count: data.get_i64("desired_node_count").unwrap_or(1),
        min_node_count: auto_scale.then(|| data.get_i64("min_node_count")).flatten(),
        max_node_count: auto_scale.then(|| data.get_i64("max_node_count")).flatten(),
    }
}

impl KubernetesNodePool {
    #[allow(clippy::too_many_arguments)]
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        engine_id: &str,
        id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        converge(ctx, waiter(TYPE, id, pending, target, timeout), GonePolicy::NotFound, || async move {
            let d = client.kubernetes().get_node_pool(ctx, engine_id, id).await;
            d.map(|d| {
                let s = d.node_pool_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for KubernetesNodePool {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        let count = || Field::int().optional().validate(validate::int_between(1, 100));
        schema([
            ("engine_id", Field::string().required().force_new()),
            (
                "name",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::name_with_dash(3, 20)),
            ),
            (
                "cpu_count",
                Field::int().required().force_new().validate(validate::int_between(1, 128)),
            ),
            (
                "memory_size_gb",
                Field::int().required().force_new().validate(validate::int_between(1, 1024)),
            ),
            (
                "storage_size_gb",
                Field::int()
                    .optional()
                    .force_new()
                    .default_value(100)
                    .validate(validate::int_between(100, 5120)),
            ),
            ("image_id", Field::string().required().force_new()),
            ("auto_scale", Field::bool().optional().default_value(false)),
            ("auto_recovery", Field::bool().optional().default_value(false)),
            ("desired_node_count", count().default_value(1)),
            ("min_node_count", count()),
            ("max_node_count", count()),
            ("scale_id", Field::string().computed()),
            ("k8s_version", Field::string().computed()),
            ("state", Field::string().computed()),
        ])
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::uniform(NODE_POOL_TIMEOUT)
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let root = AttributePath::root();
        let min = data.get_i64("min_node_count");
        let max = data.get_i64("max_node_count");

        if !data.get_bool("auto_scale") {
            for key in ["min_node_count", "max_node_count"] {
                if data.get(key).is_some() {
                    diags.error(&root.key(key), "only valid with auto_scale = true");
                }
            }
            return diags;
        }

        match (min, max) {
            (Some(min), Some(max)) => {
                if min > max {
                    diags.error(&root.key("min_node_count"), "must not exceed max_node_count");
                }
                if let Some(desired) = data.get_i64("desired_node_count") {
                    if desired < min || desired > max {
                        diags.error(
                            &root.key("desired_node_count"),
                            format!("must be between {} and {}", min, max),
                        );
                    }
                }
            }
            _ => diags.error(
                &root,
                "auto_scale = true needs min_node_count and max_node_count",
            ),
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let engine_id = data.get_string("engine_id");
        let engine = client.kubernetes().get_engine(ctx, &engine_id).await?;
        let group_id = resolver::resolve_product_group(
            ctx,
            client,
            &engine.service_zone_id,
            PRODUCT_GROUP,
            TARGET_PRODUCT,
        )
        .await?;
        let scale_id = resolver::resolve_scale(
            ctx,
            client,
            &group_id,
            data.get_i64("cpu_count").unwrap_or_default(),
            data.get_i64("memory_size_gb").unwrap_or_default(),
        )
        .await?;

        let scale = scale_request(data);
        let req = CreateNodePoolRequest {
            node_pool_name: data.get_string("name"),
            product_group_id: group_id,
            scale_id,
            image_id: data.get_string("image_id"),
            storage_size: data.get_i64("storage_size_gb").unwrap_or(100),
            auto_scale: scale.auto_scale,
            auto_recovery: data.get_bool("auto_recovery"),
            desired_node_count: scale.desired_node_count,
            min_node_count: scale.min_node_count,
            max_node_count: scale.max_node_count,
        };
        let ack = client
            .kubernetes()
            .create_node_pool(ctx, &engine_id, &req)
            .await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(
            ctx,
            client,
            &engine_id,
            &id,
            &[state::CREATING],
            &[state::RUNNING],
            timeout,
        )
        .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let engine_id = data.get_string("engine_id");
        if let Some(detail) = detail_or_gone(
            data,
            self.gone_policy(),
            client.kubernetes().get_node_pool(ctx, &engine_id, &id),
        )
        .await?
        {
            data.set_map(state_of(&detail));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let engine_id = data.get_string("engine_id");
        let timeout = self.timeouts().for_update(client);

        if ["auto_scale", "desired_node_count", "min_node_count", "max_node_count"]
            .iter()
            .any(|k| data.has_change(k))
        {
            let req = scale_request(data);
            client
                .kubernetes()
                .update_node_pool_scale(ctx, &engine_id, &id, &req)
                .await?;
            self.wait(
                ctx,
                client,
                &engine_id,
                &id,
                &[state::EDITING, SCALING],
                &[state::RUNNING],
                timeout,
            )
            .await?;
        }

        if data.has_change("auto_recovery") {
            client
                .kubernetes()
                .update_node_pool_recovery(ctx, &engine_id, &id, data.get_bool("auto_recovery"))
                .await?;
            self.wait(
                ctx,
                client,
                &engine_id,
                &id,
                &[state::EDITING],
                &[state::RUNNING],
                timeout,
            )
            .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let engine_id = data.get_string("engine_id");
        client
            .kubernetes()
            .delete_node_pool(ctx, &engine_id, &id)
            .await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &engine_id,
            &id,
            &[state::RUNNING, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    fn list_schema(&self) -> Schema {
        schema([("engine_id", Field::string().required())])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let engine_id = args.get_string("engine_id");
        let engine = engine_id.as_str();
        let resp = all_pages(|page| async move {
            client.kubernetes().list_node_pools(ctx, engine, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| {
                let mut state = state_of(d);
                state.insert("engine_id".to_string(), Value::String(engine_id.clone()));
                with_id(state, &d.node_pool_id)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    fn config() -> Value {
        json!({
            "engine_id": "K8S-1",
            "name": "pool-1",
            "cpu_count": 4,
            "memory_size_gb": 8,
            "image_id": "IMAGE-1",
        })
    }

    #[test]
    fn test_forty_minute_windows() {
        let t = KubernetesNodePool.timeouts();
        assert_eq!(t, Timeouts::uniform(Duration::from_secs(2400)));
    }

    #[test]
    fn test_bounds_need_autoscale() {
        let mut c = config();
        c["min_node_count"] = json!(1);
        let diags = testing::validate(KubernetesNodePool, c);
        assert!(diags.to_string().contains("only valid with auto_scale"));
    }

    #[test]
    fn test_autoscale_bounds() {
        let mut c = config();
        c["auto_scale"] = json!(true);
        assert!(testing::validate(KubernetesNodePool, c.clone()).has_errors());

        c["min_node_count"] = json!(1);
        c["max_node_count"] = json!(3);
        c["desired_node_count"] = json!(2);
        let diags = testing::validate(KubernetesNodePool, c.clone());
        assert!(diags.is_empty(), "{}", diags);

        c["desired_node_count"] = json!(5);
        let diags = testing::validate(KubernetesNodePool, c);
        assert!(diags.to_string().contains("desired_node_count"));
    }

    #[test]
    fn test_fixed_pool_drops_reported_bounds() {
        let d = NodePoolDetail {
            node_pool_id: "NP-1".into(),
            auto_scale: false,
            desired_node_count: 2,
            ..Default::default()
        };
        let state = state_of(&d);
        assert!(!state.contains_key("min_node_count"));
        assert_eq!(state["desired_node_count"], 2);
    }

    #[test]
    fn test_scale_request_omits_bounds_without_autoscale() {
        let mut c = config();
        c["desired_node_count"] = json!(3);
        let data = testing::data(&KubernetesNodePool, None, Some(c));
        let req = scale_request(&data);
        assert!(!req.auto_scale);
        assert_eq!(req.desired_node_count, 3);
        assert_eq!(req.min_node_count, None);
    }
}
