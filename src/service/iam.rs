//! IAM Service
//!
//! Role operations complete synchronously: the response already carries the
//! final role, so nothing here is polled.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{ListResponse, Page, Tag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustPrincipals {
    pub project_ids: Vec<String>,
    pub user_srns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RolePolicy {
    pub policy_id: String,
    pub policy_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleDetail {
    pub role_id: String,
    pub role_name: String,
    pub description: String,
    pub role_srn: String,
    pub trust_principals: TrustPrincipals,
    pub policies: Vec<RolePolicy>,
    pub created_by: String,
    pub created_dt: String,
    pub modified_dt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub role_name: String,
    pub description: String,
    pub trust_principals: TrustPrincipals,
    pub policy_ids: Vec<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub role_name: String,
    pub description: String,
    pub trust_principals: TrustPrincipals,
}

pub struct IamService<'a> {
    client: &'a ScpClient,
}

impl<'a> IamService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn create_role(&self, ctx: &Context, req: &CreateRoleRequest) -> Result<RoleDetail> {
        self.client.post(ctx, Service::Iam, "v2/roles", req).await
    }

    pub async fn get_role(&self, ctx: &Context, role_id: &str) -> Result<RoleDetail> {
        let path = format!("v2/roles/{}", seg(role_id));
        self.client.get(ctx, Service::Iam, &path, &Query::new()).await
    }

    pub async fn list_roles(
        &self,
        ctx: &Context,
        role_name: Option<&str>,
        page: Page,
    ) -> Result<ListResponse<RoleDetail>> {
        let query = Query::new().opt("roleName", role_name).page(page);
        self.client.get(ctx, Service::Iam, "v2/roles", &query).await
    }

    pub async fn update_role(
        &self,
        ctx: &Context,
        role_id: &str,
        req: &UpdateRoleRequest,
    ) -> Result<RoleDetail> {
        let path = format!("v2/roles/{}", seg(role_id));
        self.client.put(ctx, Service::Iam, &path, req).await
    }

    /// Replace the attached policy list
    pub async fn update_policies(
        &self,
        ctx: &Context,
        role_id: &str,
        policy_ids: &[String],
    ) -> Result<RoleDetail> {
        let path = format!("v2/roles/{}/policies", seg(role_id));
        let body = serde_json::json!({ "policyIds": policy_ids });
        self.client.put(ctx, Service::Iam, &path, &body).await
    }

    pub async fn delete_role(&self, ctx: &Context, role_id: &str) -> Result<()> {
        let path = format!("v2/roles/{}", seg(role_id));
        let _: Value = self.client.delete(ctx, Service::Iam, &path).await?;
        Ok(())
    }
}
