//! VPC Service
//!
//! VPCs and VPC direct connects (peering between a requester VPC and an
//! approver VPC, possibly in another project).

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

// ============================================================================
// VPC
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcDetail {
    pub vpc_id: String,
    pub vpc_name: String,
    pub vpc_description: String,
    pub vpc_state: String,
    pub service_zone_id: String,
    pub project_id: String,
    pub created_by: String,
    pub created_dt: String,
    pub modified_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVpcRequest {
    pub vpc_name: String,
    pub vpc_description: String,
    pub service_zone_id: String,
    pub tags: Vec<Tag>,
}

/// Optional list filters; `None` is omitted from the query
#[derive(Debug, Clone, Copy, Default)]
pub struct ListVpcs<'a> {
    pub vpc_name: Option<&'a str>,
    pub vpc_state: Option<&'a str>,
    pub service_zone_id: Option<&'a str>,
    pub page: Page,
}

// ============================================================================
// VPC direct connect
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcDcDetail {
    pub vpc_dc_id: String,
    pub vpc_dc_name: String,
    pub vpc_dc_description: String,
    pub vpc_dc_state: String,
    pub requester_vpc_id: String,
    pub requester_project_id: String,
    pub approver_vpc_id: String,
    pub approver_project_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVpcDcRequest {
    pub vpc_dc_name: String,
    pub vpc_dc_description: String,
    pub requester_vpc_id: String,
    pub approver_vpc_id: String,
    pub approver_project_id: String,
    pub tags: Vec<Tag>,
}

pub struct VpcService<'a> {
    client: &'a ScpClient,
}

impl<'a> VpcService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, req: &CreateVpcRequest) -> Result<AsyncResponse> {
        self.client.post(ctx, Service::Vpc, "v3/vpcs", req).await
    }

    pub async fn get(&self, ctx: &Context, vpc_id: &str) -> Result<VpcDetail> {
        let path = format!("v2/vpcs/{}", seg(vpc_id));
        self.client.get(ctx, Service::Vpc, &path, &Query::new()).await
    }

    pub async fn list(&self, ctx: &Context, opts: &ListVpcs<'_>) -> Result<ListResponse<VpcDetail>> {
        let query = Query::new()
            .opt("vpcName", opts.vpc_name)
            .opt("vpcState", opts.vpc_state)
            .opt("serviceZoneId", opts.service_zone_id)
            .page(opts.page);
        self.client.get(ctx, Service::Vpc, "v2/vpcs", &query).await
    }

    pub async fn update_description(
        &self,
        ctx: &Context,
        vpc_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/vpcs/{}/description", seg(vpc_id));
        let body = serde_json::json!({ "vpcDescription": description });
        self.client.put(ctx, Service::Vpc, &path, &body).await
    }

    pub async fn delete(&self, ctx: &Context, vpc_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/vpcs/{}", seg(vpc_id));
        self.client.delete(ctx, Service::Vpc, &path).await
    }

    pub async fn create_dc(&self, ctx: &Context, req: &CreateVpcDcRequest) -> Result<AsyncResponse> {
        self.client.post(ctx, Service::Vpc, "v2/vpc-dcs", req).await
    }

    pub async fn get_dc(&self, ctx: &Context, vpc_dc_id: &str) -> Result<VpcDcDetail> {
        let path = format!("v2/vpc-dcs/{}", seg(vpc_dc_id));
        self.client.get(ctx, Service::Vpc, &path, &Query::new()).await
    }

    pub async fn list_dcs(
        &self,
        ctx: &Context,
        requester_vpc_id: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<VpcDcDetail>> {
        let query = Query::new()
            .opt("requesterVpcId", requester_vpc_id)
            .page(page);
        self.client.get(ctx, Service::Vpc, "v2/vpc-dcs", &query).await
    }

    pub async fn update_dc_description(
        &self,
        ctx: &Context,
        vpc_dc_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/vpc-dcs/{}/description", seg(vpc_dc_id));
        let body = serde_json::json!({ "vpcDcDescription": description });
        self.client.put(ctx, Service::Vpc, &path, &body).await
    }

    pub async fn delete_dc(&self, ctx: &Context, vpc_dc_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/vpc-dcs/{}", seg(vpc_dc_id));
        self.client.delete(ctx, Service::Vpc, &path).await
    }
}
