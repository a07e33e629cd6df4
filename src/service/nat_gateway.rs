//! NAT Gateway Service

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NatGatewayDetail {
    pub nat_gateway_id: String,
    pub nat_gateway_name: String,
    pub nat_gateway_state: String,
    pub nat_gateway_description: String,
    /// Address of the attached public IP
    pub nat_gateway_ip_address: String,
    pub public_ip_address_id: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateNatGatewayRequest {
    pub subnet_id: String,
    pub public_ip_address_id: String,
    pub nat_gateway_description: String,
    pub tags: Vec<Tag>,
}

pub struct NatGatewayService<'a> {
    client: &'a ScpClient,
}

impl<'a> NatGatewayService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, req: &CreateNatGatewayRequest) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::NatGateway, "v3/nat-gateways", req)
            .await
    }

    pub async fn get(&self, ctx: &Context, gateway_id: &str) -> Result<NatGatewayDetail> {
        let path = format!("v2/nat-gateways/{}", seg(gateway_id));
        self.client
            .get(ctx, Service::NatGateway, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        vpc_id: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<NatGatewayDetail>> {
        let query = Query::new().opt("vpcId", vpc_id).page(page);
        self.client
            .get(ctx, Service::NatGateway, "v2/nat-gateways", &query)
            .await
    }

    pub async fn update_description(
        &self,
        ctx: &Context,
        gateway_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/nat-gateways/{}/description", seg(gateway_id));
        let body = serde_json::json!({ "natGatewayDescription": description });
        self.client.put(ctx, Service::NatGateway, &path, &body).await
    }

    pub async fn delete(&self, ctx: &Context, gateway_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/nat-gateways/{}", seg(gateway_id));
        self.client.delete(ctx, Service::NatGateway, &path).await
    }
}
