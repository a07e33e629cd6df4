//! Subnet Service

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SubnetDetail {
    pub subnet_id: String,
    pub subnet_name: String,
    pub subnet_cidr_block: String,
    pub subnet_type: String,
    pub subnet_state: String,
    pub subnet_description: String,
    pub subnet_gateway_ip_address: String,
    pub vpc_id: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetRequest {
    pub subnet_name: String,
    pub subnet_cidr_block: String,
    pub subnet_type: String,
    pub vpc_id: String,
    pub subnet_description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListSubnets<'a> {
    pub vpc_id: Option<&'a str>,
    pub subnet_name: Option<&'a str>,
    pub subnet_type: Option<&'a str>,
    pub page: Page,
}

pub struct SubnetService<'a> {
    client: &'a ScpClient,
}

impl<'a> SubnetService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, req: &CreateSubnetRequest) -> Result<AsyncResponse> {
        self.client.post(ctx, Service::Subnet, "v2/subnets", req).await
    }

    pub async fn get(&self, ctx: &Context, subnet_id: &str) -> Result<SubnetDetail> {
        let path = format!("v2/subnets/{}", seg(subnet_id));
        self.client.get(ctx, Service::Subnet, &path, &Query::new()).await
    }

    pub async fn list(&self, ctx: &Context, opts: &ListSubnets<'_>) -> Result<ListResponse<SubnetDetail>> {
        let query = Query::new()
            .opt("vpcId", opts.vpc_id)
            .opt("subnetName", opts.subnet_name)
            .opt("subnetTypes", opts.subnet_type)
            .page(opts.page);
        self.client.get(ctx, Service::Subnet, "v2/subnets", &query).await
    }

    pub async fn update_description(
        &self,
        ctx: &Context,
        subnet_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/subnets/{}/description", seg(subnet_id));
        let body = serde_json::json!({ "subnetDescription": description });
        self.client.put(ctx, Service::Subnet, &path, &body).await
    }

    pub async fn delete(&self, ctx: &Context, subnet_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/subnets/{}", seg(subnet_id));
        self.client.delete(ctx, Service::Subnet, &path).await
    }
}
