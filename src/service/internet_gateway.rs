//! Internet Gateway Service
//!
//! Creating an internet gateway also creates a firewall attached to it; that
//! firewall is managed through the firewall service.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InternetGatewayDetail {
    pub internet_gateway_id: String,
    pub internet_gateway_name: String,
    pub internet_gateway_state: String,
    pub internet_gateway_type: String,
    pub internet_gateway_description: String,
    pub vpc_id: String,
    pub service_zone_id: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternetGatewayRequest {
    pub vpc_id: String,
    pub internet_gateway_type: String,
    pub internet_gateway_description: String,
    pub firewall_enabled: bool,
    pub firewall_loggable: bool,
    pub tags: Vec<Tag>,
}

pub struct InternetGatewayService<'a> {
    client: &'a ScpClient,
}

impl<'a> InternetGatewayService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        ctx: &Context,
        req: &CreateInternetGatewayRequest,
    ) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::InternetGateway, "v4/internet-gateways", req)
            .await
    }

    pub async fn get(&self, ctx: &Context, gateway_id: &str) -> Result<InternetGatewayDetail> {
        let path = format!("v2/internet-gateways/{}", seg(gateway_id));
        self.client
            .get(ctx, Service::InternetGateway, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        vpc_id: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<InternetGatewayDetail>> {
        let query = Query::new().opt("vpcId", vpc_id).page(page);
        self.client
            .get(ctx, Service::InternetGateway, "v2/internet-gateways", &query)
            .await
    }

    pub async fn update_description(
        &self,
        ctx: &Context,
        gateway_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/internet-gateways/{}/description", seg(gateway_id));
        let body = serde_json::json!({ "internetGatewayDescription": description });
        self.client
            .put(ctx, Service::InternetGateway, &path, &body)
            .await
    }

    pub async fn delete(&self, ctx: &Context, gateway_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/internet-gateways/{}", seg(gateway_id));
        self.client
            .delete(ctx, Service::InternetGateway, &path)
            .await
    }
}
