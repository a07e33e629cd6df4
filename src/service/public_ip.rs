//! Public IP Service

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicIpDetail {
    pub public_ip_address_id: String,
    pub ip_address: String,
    pub public_ip_state: String,
    pub public_ip_description: String,
    pub uplink_type: String,
    pub service_zone_id: String,
    pub attached_object_name: String,
    pub created_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePublicIpRequest {
    pub service_zone_id: String,
    pub uplink_type: String,
    pub public_ip_description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListPublicIps<'a> {
    pub ip_address: Option<&'a str>,
    pub service_zone_id: Option<&'a str>,
    pub uplink_type: Option<&'a str>,
    pub public_ip_state: Option<&'a str>,
    pub page: Page,
}

pub struct PublicIpService<'a> {
    client: &'a ScpClient,
}

impl<'a> PublicIpService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, req: &CreatePublicIpRequest) -> Result<AsyncResponse> {
        self.client.post(ctx, Service::PublicIp, "v4/public-ips", req).await
    }

    pub async fn get(&self, ctx: &Context, public_ip_id: &str) -> Result<PublicIpDetail> {
        let path = format!("v2/public-ips/{}", seg(public_ip_id));
        self.client
            .get(ctx, Service::PublicIp, &path, &Query::new())
            .await
    }

    pub async fn list(
        &self,
        ctx: &Context,
        opts: &ListPublicIps<'_>,
    ) -> Result<ListResponse<PublicIpDetail>> {
        let query = Query::new()
            .opt("ipAddress", opts.ip_address)
            .opt("serviceZoneId", opts.service_zone_id)
            .opt("uplinkType", opts.uplink_type)
            .opt("publicIpState", opts.public_ip_state)
            .page(opts.page);
        self.client
            .get(ctx, Service::PublicIp, "v2/public-ips", &query)
            .await
    }

    pub async fn update_description(
        &self,
        ctx: &Context,
        public_ip_id: &str,
        description: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("v2/public-ips/{}/description", seg(public_ip_id));
        let body = serde_json::json!({ "publicIpDescription": description });
        self.client.put(ctx, Service::PublicIp, &path, &body).await
    }

    pub async fn delete(&self, ctx: &Context, public_ip_id: &str) -> Result<AsyncResponse> {
        let path = format!("v2/public-ips/{}", seg(public_ip_id));
        self.client.delete(ctx, Service::PublicIp, &path).await
    }
}
