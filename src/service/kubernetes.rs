//! Kubernetes Engine Service
//!
//! Engines (control planes) and their node pools. Deleted engines are
//! reported as 403 rather than 404 for a while after removal.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

// ============================================================================
// Engines
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct KubernetesEngineDetail {
    pub kubernetes_engine_id: String,
    pub kubernetes_engine_name: String,
    pub kubernetes_engine_status: String,
    pub k8s_version: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub security_group_id: String,
    pub volume_id: String,
    pub service_zone_id: String,
    pub cloud_logging_enabled: bool,
    pub public_endpoint_access_control_ip: String,
    pub public_endpoint_url: String,
    pub private_endpoint_url: String,
    pub node_pool_count: i64,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateKubernetesEngineRequest {
    pub kubernetes_engine_name: String,
    pub k8s_version: String,
    pub product_group_id: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub security_group_id: String,
    pub volume_id: String,
    pub zone_id: String,
    pub cloud_logging_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_endpoint_access_control_ip: Option<String>,
    pub tags: Vec<Tag>,
}

// ============================================================================
// Node pools
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePoolDetail {
    pub node_pool_id: String,
    pub node_pool_name: String,
    pub node_pool_state: String,
    pub kubernetes_engine_id: String,
    pub scale_id: String,
    pub cpu_count: i64,
    pub memory_size: i64,
    pub storage_size: i64,
    pub image_id: String,
    pub auto_scale: bool,
    pub auto_recovery: bool,
    pub desired_node_count: i64,
    pub min_node_count: i64,
    pub max_node_count: i64,
    pub k8s_version: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodePoolRequest {
    pub node_pool_name: String,
    pub product_group_id: String,
    pub scale_id: String,
    pub image_id: String,
    pub storage_size: i64,
    pub auto_scale: bool,
    pub auto_recovery: bool,
    pub desired_node_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolScaleRequest {
    pub auto_scale: bool,
    pub desired_node_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i64>,
}

pub struct KubernetesService<'a> {
    client: &'a ScpClient,
}

fn engine_path(engine_id: &str) -> String {
    format!("v2/kubernetes-engines/{}", seg(engine_id))
}

fn node_pool_path(engine_id: &str, node_pool_id: &str) -> String {
    format!("{}/node-pools/{}", engine_path(engine_id), seg(node_pool_id))
}

impl<'a> KubernetesService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create_engine(
        &self,
        ctx: &Context,
        req: &CreateKubernetesEngineRequest,
    ) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::Kubernetes, "v2/kubernetes-engines", req)
            .await
    }

    pub async fn get_engine(&self, ctx: &Context, engine_id: &str) -> Result<KubernetesEngineDetail> {
        self.client
            .get(ctx, Service::Kubernetes, &engine_path(engine_id), &Query::new())
            .await
    }

    pub async fn list_engines(
        &self,
        ctx: &Context,
        name: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<KubernetesEngineDetail>> {
        let query = Query::new()
            .opt("kubernetesEngineName", name)
            .page(page);
        self.client
            .get(ctx, Service::Kubernetes, "v2/kubernetes-engines", &query)
            .await
    }

    pub async fn upgrade_engine(
        &self,
        ctx: &Context,
        engine_id: &str,
        k8s_version: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/upgrade", engine_path(engine_id));
        let body = serde_json::json!({ "k8sVersion": k8s_version });
        self.client.put(ctx, Service::Kubernetes, &path, &body).await
    }

    pub async fn update_public_acl(
        &self,
        ctx: &Context,
        engine_id: &str,
        acl_ip: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/public-endpoint", engine_path(engine_id));
        let body = serde_json::json!({ "publicEndpointAccessControlIp": acl_ip });
        self.client.put(ctx, Service::Kubernetes, &path, &body).await
    }

    pub async fn delete_engine(&self, ctx: &Context, engine_id: &str) -> Result<AsyncResponse> {
        self.client
            .delete(ctx, Service::Kubernetes, &engine_path(engine_id))
            .await
    }

    pub async fn create_node_pool(
        &self,
        ctx: &Context,
        engine_id: &str,
        req: &CreateNodePoolRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/node-pools", engine_path(engine_id));
        self.client.post(ctx, Service::Kubernetes, &path, req).await
    }

    pub async fn get_node_pool(
        &self,
        ctx: &Context,
        engine_id: &str,
        node_pool_id: &str,
    ) -> Result<NodePoolDetail> {
        self.client
            .get(
                ctx,
                Service::Kubernetes,
                &node_pool_path(engine_id, node_pool_id),
                &Query::new(),
            )
            .await
    }

    pub async fn list_node_pools(
        &self,
        ctx: &Context,
        engine_id: &str,
        page: Page,
    ) -> Result<ListResponse<NodePoolDetail>> {
        let path = format!("{}/node-pools", engine_path(engine_id));
        self.client
            .get(ctx, Service::Kubernetes, &path, &Query::new().page(page))
            .await
    }

    pub async fn update_node_pool_scale(
        &self,
        ctx: &Context,
        engine_id: &str,
        node_pool_id: &str,
        req: &NodePoolScaleRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/scale", node_pool_path(engine_id, node_pool_id));
        self.client.put(ctx, Service::Kubernetes, &path, req).await
    }

    pub async fn update_node_pool_recovery(
        &self,
        ctx: &Context,
        engine_id: &str,
        node_pool_id: &str,
        auto_recovery: bool,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/auto-recovery", node_pool_path(engine_id, node_pool_id));
        let body = serde_json::json!({ "autoRecovery": auto_recovery });
        self.client.put(ctx, Service::Kubernetes, &path, &body).await
    }

    pub async fn delete_node_pool(
        &self,
        ctx: &Context,
        engine_id: &str,
        node_pool_id: &str,
    ) -> Result<AsyncResponse> {
        self.client
            .delete(
                ctx,
                Service::Kubernetes,
                &node_pool_path(engine_id, node_pool_id),
            )
            .await
    }
}
