//! Load Balancer Service
//!
//! Profiles hang off a load balancer and are shared by its services.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{AsyncResponse, ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbProfileDetail {
    pub lb_profile_id: String,
    pub lb_profile_name: String,
    pub lb_profile_state: String,
    pub load_balancer_id: String,
    pub profile_category: String,
    pub protocol: String,
    pub layer_type: String,
    pub redirect_type: String,
    pub request_header_size: i64,
    pub response_timeout: i64,
    pub session_timeout: i64,
    pub persistence_type: String,
    pub created_dt: String,
}

/// Body shared by create and update; unset options are left out
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LbProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lb_profile_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_header_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

pub struct LoadBalancerService<'a> {
    client: &'a ScpClient,
}

fn profiles_path(lb_id: &str) -> String {
    format!("v2/load-balancers/{}/lb-profiles", seg(lb_id))
}

impl<'a> LoadBalancerService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create_profile(
        &self,
        ctx: &Context,
        lb_id: &str,
        req: &LbProfileRequest,
    ) -> Result<AsyncResponse> {
        self.client
            .post(ctx, Service::LoadBalancer, &profiles_path(lb_id), req)
            .await
    }

    pub async fn get_profile(
        &self,
        ctx: &Context,
        lb_id: &str,
        profile_id: &str,
    ) -> Result<LbProfileDetail> {
        let path = format!("{}/{}", profiles_path(lb_id), seg(profile_id));
        self.client
            .get(ctx, Service::LoadBalancer, &path, &Query::new())
            .await
    }

    pub async fn list_profiles(
        &self,
        ctx: &Context,
        lb_id: &str,
        category: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<LbProfileDetail>> {
        let query = Query::new().opt("profileCategory", category).page(page);
        self.client
            .get(ctx, Service::LoadBalancer, &profiles_path(lb_id), &query)
            .await
    }

    pub async fn update_profile(
        &self,
        ctx: &Context,
        lb_id: &str,
        profile_id: &str,
        req: &LbProfileRequest,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/{}", profiles_path(lb_id), seg(profile_id));
        self.client.put(ctx, Service::LoadBalancer, &path, req).await
    }

    pub async fn delete_profile(
        &self,
        ctx: &Context,
        lb_id: &str,
        profile_id: &str,
    ) -> Result<AsyncResponse> {
        let path = format!("{}/{}", profiles_path(lb_id), seg(profile_id));
        self.client.delete(ctx, Service::LoadBalancer, &path).await
    }
}
