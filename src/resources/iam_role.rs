//! IAM role resource
//!
//! Role calls return the final role directly; none of the operations poll.

use super::object;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::provider::lifecycle::{detail_or_gone, with_id, Resource};
use crate::schema::{schema, AttributePath, Diagnostics, Field, ResourceData, Schema, Type};
use crate::scp::{all_pages, ScpClient};
use crate::service::iam::{CreateRoleRequest, RoleDetail, TrustPrincipals, UpdateRoleRequest};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const TYPE: &str = "scp_iam_role";

pub struct IamRole;

fn strings(data: &ResourceData, key: &str) -> Vec<String> {
    data.get_list(key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn trust(data: &ResourceData) -> TrustPrincipals {
    TrustPrincipals {
        project_ids: strings(data, "trust_project_ids"),
        user_srns: strings(data, "trust_user_srns"),
    }
}

fn state_of(d: &RoleDetail) -> Map<String, Value> {
    let policy_ids: Vec<&str> = d.policies.iter().map(|p| p.policy_id.as_str()).collect();
    object(json!({
        "name": d.role_name,
        "description": d.description,
        "trust_project_ids": d.trust_principals.project_ids,
        "trust_user_srns": d.trust_principals.user_srns,
        "policy_ids": policy_ids,
        "role_srn": d.role_srn,
        "created_by": d.created_by,
        "created_dt": d.created_dt,
        "modified_dt": d.modified_dt,
    }))
}

#[async_trait]
impl Resource for IamRole {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            (
                "name",
                Field::string()
                    .required()
                    .validate(validate::regex_match(
                        r"^[A-Za-z0-9+=,.@_-]{1,64}$",
                        "must be 1-64 characters of letters, digits or +=,.@_-",
                    )),
            ),
            (
                "description",
                Field::string().optional().validate(validate::description()),
            ),
            (
                "trust_project_ids",
                Field::list_of(Type::String)
                    .optional()
                    .describe("Projects allowed to assume the role"),
            ),
            (
                "trust_user_srns",
                Field::list_of(Type::String)
                    .optional()
                    .describe("Users allowed to assume the role"),
            ),
            ("policy_ids", Field::set_of(Type::String).optional()),
            ("role_srn", Field::string().computed()),
            ("created_by", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            ("modified_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if data.get_list("trust_project_ids").is_empty() && data.get_list("trust_user_srns").is_empty() {
            diags.error(
                &AttributePath::root(),
                "at least one of trust_project_ids or trust_user_srns is required",
            );
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let req = CreateRoleRequest {
            role_name: data.get_string("name"),
            description: data.get_string("description"),
            trust_principals: trust(data),
            policy_ids: strings(data, "policy_ids"),
            tags: tags::to_tags(data.get(TAGS)),
        };
        let role = client.iam().create_role(ctx, &req).await?;
        if role.role_id.is_empty() {
            return Err(Error::Precondition(format!(
                "create of {} returned no resource ID",
                TYPE
            )));
        }
        tracing::info!("created {} {}", TYPE, role.role_id);
        data.set_id(role.role_id.clone());
        data.set_map(state_of(&role));
        Ok(())
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        if let Some(role) =
            detail_or_gone(data, self.gone_policy(), client.iam().get_role(ctx, &id)).await?
        {
            data.set_map(state_of(&role));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if ["name", "description", "trust_project_ids", "trust_user_srns"]
            .iter()
            .any(|k| data.has_change(k))
        {
            let req = UpdateRoleRequest {
                role_name: data.get_string("name"),
                description: data.get_string("description"),
                trust_principals: trust(data),
            };
            client.iam().update_role(ctx, &id, &req).await?;
        }

        if data.has_change("policy_ids") {
            let policy_ids = strings(data, "policy_ids");
            tracing::info!("attaching {} policies to {}", policy_ids.len(), id);
            client.iam().update_policies(ctx, &id, &policy_ids).await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.iam().delete_role(ctx, &id).await
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, _args: &ResourceData) -> Result<Vec<Value>> {
        let resp = all_pages(|page| async move { client.iam().list_roles(ctx, None, page).await })
            .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.role_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;
    use crate::service::iam::RolePolicy;

    #[test]
    fn test_needs_a_principal() {
        let diags = testing::validate(IamRole, json!({"name": "deployer"}));
        assert!(diags.to_string().contains("trust_project_ids"));
        let diags = testing::validate(
            IamRole,
            json!({"name": "deployer", "trust_project_ids": ["PROJECT-1"]}),
        );
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_policies_flatten_to_ids() {
        let role = RoleDetail {
            role_id: "ROLE-1".into(),
            role_name: "deployer".into(),
            policies: vec![
                RolePolicy {
                    policy_id: "POL-1".into(),
                    policy_name: "ViewOnly".into(),
                },
                RolePolicy {
                    policy_id: "POL-2".into(),
                    policy_name: "Admin".into(),
                },
            ],
            ..Default::default()
        };
        let state = state_of(&role);
        assert_eq!(state["policy_ids"], json!(["POL-1", "POL-2"]));
        assert_eq!(state["trust_user_srns"], json!([]));
    }
}
