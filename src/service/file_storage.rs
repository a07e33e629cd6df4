//! File Storage Service
//!
//! Served from the storage host when `oss2_service_host` is configured.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotSchedule {
    /// DAILY or WEEKLY
    pub frequency: String,
    /// MON..SUN; only for WEEKLY
    #[serde(skip_serializing_if = "String::is_empty")]
    pub day_of_week: String,
    pub hour: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FileStorageDetail {
    pub file_storage_id: String,
    pub file_storage_name: String,
    pub file_storage_state: String,
    pub file_storage_protocol: String,
    pub disk_type: String,
    pub encryption_enabled: bool,
    pub service_zone_id: String,
    pub snapshot_policy_enabled: bool,
    pub snapshot_retention_count: i64,
    pub snapshot_capacity_rate: i64,
    pub snapshot_schedule: Option<SnapshotSchedule>,
    pub file_storage_usage: i64,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileStorageRequest {
    pub file_storage_name: String,
    pub file_storage_protocol: String,
    pub disk_type: String,
    pub service_zone_id: String,
    pub encryption_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cifs_password: Option<String>,
    pub snapshot_policy_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_retention_count: Option<i64>,
    pub snapshot_capacity_rate: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_schedule: Option<SnapshotSchedule>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPolicyRequest {
    pub snapshot_policy_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_retention_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_schedule: Option<SnapshotSchedule>,
}

pub struct FileStorageService<'a> {
    client: &'a ScpClient,
}

impl<'a> FileStorageService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, req: &CreateFileStorageRequest) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::FileStorage, "v4/file-storages", req)
            .await
    }

    pub async fn get(&self, ctx: &Context, storage_id: &str) -> Result<FileStorageDetail> {
        let path = format!("v3/file-storages/{}", seg(storage_id));
        self.client
            .get(ctx, Service::FileStorage, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        file_storage_name: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<FileStorageDetail>> {
        let query = Query::new()
            .opt("fileStorageName", file_storage_name)
            .page(page);
        self.client
            .get(ctx, Service::FileStorage, "v3/file-storages", &query)
            .await
    }

    pub async fn update_snapshot_policy(
        &self,
        ctx: &Context,
        storage_id: &str,
        req: &SnapshotPolicyRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/file-storages/{}/snapshot-policy", seg(storage_id));
        self.client.put(ctx, Service::FileStorage, &path, req).await
    }

    pub async fn update_capacity_rate(
        &self,
        ctx: &Context,
        storage_id: &str,
        rate: i64,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/file-storages/{}/snapshot-capacity", seg(storage_id));
        let body = serde_json::json!({ "snapshotCapacityRate": rate });
        self.client.put(ctx, Service::FileStorage, &path, &body).await
    }

    pub async fn delete(&self, ctx: &Context, storage_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/file-storages/{}", seg(storage_id));
        self.client.delete(ctx, Service::FileStorage, &path).await
    }
}
