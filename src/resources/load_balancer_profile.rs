//! Load balancer profile resource
//!
//! Two kinds of profile share one API. Application profiles tune the
//! listener; persistence profiles only pin sessions, so the listener
//! settings are rejected for them.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::schema::{schema, AttributePath, Diagnostics, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::load_balancer::{LbProfileDetail, LbProfileRequest};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_load_balancer_profile";

pub const CATEGORY_APPLICATION: &str = "APPLICATION";
pub const CATEGORY_PERSISTENCE: &str = "PERSISTENCE";
pub const CATEGORIES: &[&str] = &[CATEGORY_APPLICATION, CATEGORY_PERSISTENCE];
pub const LAYER_TYPES: &[&str] = &["L4", "L7"];
pub const REDIRECT_TYPES: &[&str] = &["NONE", "HTTP_TO_HTTPS"];
pub const PERSISTENCE_TYPES: &[&str] = &["SOURCE_IP", "COOKIE"];
pub const PROTOCOLS: &[&str] = &["TCP", "UDP", "HTTP", "HTTPS"];

/// Listener settings only an application profile accepts
const APPLICATION_ONLY: &[&str] = &[
    "layer_type",
    "request_header_size",
    "response_timeout",
    "redirect_type",
];

pub struct LoadBalancerProfile;

fn state_of(d: &LbProfileDetail) -> Map<String, Value> {
    let mut state = object(json!({
        "load_balancer_id": d.load_balancer_id,
        "name": d.lb_profile_name,
        "category": d.profile_category,
        "protocol": d.protocol,
        "layer_type": d.layer_type,
        "redirect_type": d.redirect_type,
        "request_header_size": d.request_header_size,
        "response_timeout": d.response_timeout,
        "session_timeout": d.session_timeout,
        "persistence_type": d.persistence_type,
        "state": d.lb_profile_state,
        "created_dt": d.created_dt,
    }));
    // settings that do not apply to the category come back blank
    state.retain(|_, v| !(*v == "" || *v == 0));
    state
}

fn request(data: &ResourceData, with_identity: bool) -> LbProfileRequest {
    let text = |key: &str| data.get_str(key).map(str::to_string);
    LbProfileRequest {
        lb_profile_name: with_identity.then(|| data.get_string("name")),
        profile_category: with_identity.then(|| data.get_string("category")),
        protocol: text("protocol"),
        layer_type: text("layer_type"),
        redirect_type: text("redirect_type"),
        request_header_size: data.get_i64("request_header_size"),
        response_timeout: data.get_i64("response_timeout"),
        session_timeout: data.get_i64("session_timeout"),
        persistence_type: text("persistence_type"),
        tags: if with_identity {
            tags::to_tags(data.get(TAGS))
        } else {
            Vec::new()
        },
    }
}

impl LoadBalancerProfile {
    #[allow(clippy::too_many_arguments)]
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        lb_id: &str,
        id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        converge(ctx, waiter(TYPE, id, pending, target, timeout), GonePolicy::NotFound, || async move {
            let d = client.load_balancer().get_profile(ctx, lb_id, id).await;
            d.map(|d| {
                let s = d.lb_profile_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for LoadBalancerProfile {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            ("load_balancer_id", Field::string().required().force_new()),
            (
                "name",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::name_with_dash(3, 20)),
            ),
            (
                "category",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::string_in(CATEGORIES)),
            ),
            (
                "protocol",
                Field::string()
                    .optional()
                    .computed()
                    .validate(validate::string_in(PROTOCOLS)),
            ),
            (
                "layer_type",
                Field::string().optional().validate(validate::string_in(LAYER_TYPES)),
            ),
            (
                "redirect_type",
                Field::string().optional().validate(validate::string_in(REDIRECT_TYPES)),
            ),
            (
                "request_header_size",
                Field::int()
                    .optional()
                    .validate(validate::int_between(1, 64))
                    .describe("Header buffer in KB"),
            ),
            (
                "response_timeout",
                Field::int().optional().validate(validate::int_between(1, 3600)),
            ),
            (
                "session_timeout",
                Field::int().optional().validate(validate::int_between(1, 3600)),
            ),
            (
                "persistence_type",
                Field::string()
                    .optional()
                    .validate(validate::string_in(PERSISTENCE_TYPES)),
            ),
            ("state", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let root = AttributePath::root();
        match data.get_str("category") {
            Some(CATEGORY_PERSISTENCE) => {
                for key in APPLICATION_ONLY {
                    if data.get(key).is_some() {
                        diags.error(
                            &root.key(key),
                            format!("not allowed for {} profiles", CATEGORY_PERSISTENCE),
                        );
                    }
                }
            }
            Some(CATEGORY_APPLICATION) => {
                if data.get("persistence_type").is_some() {
                    diags.error(
                        &root.key("persistence_type"),
                        format!("not allowed for {} profiles", CATEGORY_APPLICATION),
                    );
                }
            }
            _ => {}
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let lb_id = data.get_string("load_balancer_id");
        let req = request(data, true);
        let ack = client.load_balancer().create_profile(ctx, &lb_id, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &lb_id, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let lb_id = data.get_string("load_balancer_id");
        if let Some(detail) = detail_or_gone(
            data,
            self.gone_policy(),
            client.load_balancer().get_profile(ctx, &lb_id, &id),
        )
        .await?
        {
            data.set_map(state_of(&detail));
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let changed = [
            "protocol",
            "layer_type",
            "redirect_type",
            "request_header_size",
            "response_timeout",
            "session_timeout",
            "persistence_type",
        ]
        .iter()
        .any(|k| data.has_change(k));
        if !changed {
            return Ok(());
        }

        let id = data.id().to_string();
        let lb_id = data.get_string("load_balancer_id");
        let req = request(data, false);
        client
            .load_balancer()
            .update_profile(ctx, &lb_id, &id, &req)
            .await?;
        let timeout = self.timeouts().for_update(client);
        self.wait(ctx, client, &lb_id, &id, &[state::EDITING], &[state::ACTIVE], timeout)
            .await
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let lb_id = data.get_string("load_balancer_id");
        client.load_balancer().delete_profile(ctx, &lb_id, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &lb_id,
            &id,
            &[state::ACTIVE, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    fn list_schema(&self) -> Schema {
        schema([
            ("load_balancer_id", Field::string().required()),
            (
                "category",
                Field::string().optional().validate(validate::string_in(CATEGORIES)),
            ),
        ])
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>> {
        let lb_id = args.get_string("load_balancer_id");
        let lb_id = lb_id.as_str();
        let category = args.get_str("category");
        let resp = all_pages(|page| async move {
            client
                .load_balancer()
                .list_profiles(ctx, lb_id, category, page)
                .await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.lb_profile_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    fn config(category: &str) -> Value {
        json!({"load_balancer_id": "LB-1", "name": "profile-1", "category": category})
    }

    #[test]
    fn test_persistence_forbids_listener_settings() {
        for key in APPLICATION_ONLY {
            let mut c = config(CATEGORY_PERSISTENCE);
            c[*key] = match *key {
                "layer_type" => json!("L4"),
                "redirect_type" => json!("NONE"),
                _ => json!(30),
            };
            let diags = testing::validate(LoadBalancerProfile, c);
            assert!(diags.to_string().contains(key), "{}", key);
        }
        let mut c = config(CATEGORY_PERSISTENCE);
        c["persistence_type"] = json!("SOURCE_IP");
        c["session_timeout"] = json!(300);
        assert!(testing::validate(LoadBalancerProfile, c).is_empty());
    }

    #[test]
    fn test_application_profile() {
        let mut c = config(CATEGORY_APPLICATION);
        c["layer_type"] = json!("L7");
        c["request_header_size"] = json!(8);
        assert!(testing::validate(LoadBalancerProfile, c.clone()).is_empty());
        c["persistence_type"] = json!("COOKIE");
        assert!(testing::validate(LoadBalancerProfile, c).has_errors());
    }

    #[test]
    fn test_unset_options_stay_out_of_request() {
        let data = testing::data(
            &LoadBalancerProfile,
            None,
            Some(json!({"load_balancer_id": "LB-1", "name": "p", "category": "PERSISTENCE", "session_timeout": 60})),
        );
        let req = request(&data, false);
        assert_eq!(req.session_timeout, Some(60));
        assert!(req.layer_type.is_none());
        assert!(req.lb_profile_name.is_none());
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body, json!({"sessionTimeout": 60}));
    }

    #[test]
    fn test_blank_settings_not_in_state() {
        let d = LbProfileDetail {
            lb_profile_id: "P-1".into(),
            profile_category: "PERSISTENCE".into(),
            session_timeout: 300,
            ..Default::default()
        };
        let state = state_of(&d);
        assert!(!state.contains_key("layer_type"));
        assert!(!state.contains_key("request_header_size"));
        assert_eq!(state["session_timeout"], 300);
    }
}
