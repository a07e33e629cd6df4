//! Project Service
//!
//! The project summary lists the service zones (regions) the project can
//! deploy into; the capability resolver scans it to map region names to
//! zone IDs.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityZone {
    pub availability_zone_name: String,
}

/// A region the project is entitled to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceZone {
    pub service_zone_id: String,
    pub service_zone_name: String,
    /// Public region name, e.g. `KR-WEST-1`
    pub service_zone_location: String,
    pub block_id: String,
    pub is_multi_availability_zone: bool,
    pub availability_zones: Vec<AvailabilityZone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInfo {
    pub project_id: String,
    pub project_name: String,
    pub account_id: String,
    pub project_state: String,
    pub service_zones: Vec<ServiceZone>,
}

pub struct ProjectService<'a> {
    client: &'a ScpClient,
}

impl<'a> ProjectService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    /// Summary of the configured project
    pub async fn info(&self, ctx: &Context) -> Result<ProjectInfo> {
        let path = format!("v2/projects/{}", seg(self.client.project_id()));
        self.client
            .get(ctx, Service::Project, &path, &Query::new())
            .await
    }
}
