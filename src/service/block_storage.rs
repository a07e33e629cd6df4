//! Block Storage Service
//!
//! Served from the storage host when `oss2_service_host` is configured.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockStorageDetail {
    pub block_storage_id: String,
    pub block_storage_name: String,
    pub block_storage_state: String,
    pub block_storage_size: i64,
    pub encrypt_enabled: bool,
    pub disk_type: String,
    pub product_id: String,
    pub service_zone_id: String,
    pub virtual_server_id: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockStorageRequest {
    pub block_storage_name: String,
    pub bs_size: i64,
    pub encrypt_enabled: bool,
    pub product_id: String,
    pub virtual_server_id: String,
    pub tags: Vec<Tag>,
}

pub struct BlockStorageService<'a> {
    client: &'a ScpClient,
}

impl<'a> BlockStorageService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        ctx: &Context,
        req: &CreateBlockStorageRequest,
    ) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::BlockStorage, "v2/block-storages", req)
            .await
    }

    pub async fn get(&self, ctx: &Context, storage_id: &str) -> Result<BlockStorageDetail> {
        let path = format!("v2/block-storages/{}", seg(storage_id));
        self.client
            .get(ctx, Service::BlockStorage, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        virtual_server_id: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<BlockStorageDetail>> {
        let query = Query::new()
            .opt("virtualServerId", virtual_server_id)
            .page(page);
        self.client
            .get(ctx, Service::BlockStorage, "v2/block-storages", &query)
            .await
    }

    pub async fn attach(
        &self,
        ctx: &Context,
        storage_id: &str,
        virtual_server_id: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/block-storages/{}/attach", seg(storage_id));
        let body = serde_json::json!({ "virtualServerId": virtual_server_id });
        self.client
            .put(ctx, Service::BlockStorage, &path, &body)
            .await
    }

    pub async fn detach(
        &self,
        ctx: &Context,
        storage_id: &str,
        virtual_server_id: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/block-storages/{}/detach", seg(storage_id));
        let body = serde_json::json!({ "virtualServerId": virtual_server_id });
        self.client
            .put(ctx, Service::BlockStorage, &path, &body)
            .await
    }

    pub async fn delete(&self, ctx: &Context, storage_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/block-storages/{}", seg(storage_id));
        self.client.delete(ctx, Service::BlockStorage, &path).await
    }
}
