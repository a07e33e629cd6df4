//! File storage resource
//!
//! NFS or CIFS shares with an optional snapshot policy. The snapshot
//! settings are validated together: a schedule or retention count only makes
//! sense with the policy switched on, and a weekly schedule needs a day.

use super::{converge, object};
use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::state;
use crate::provider::lifecycle::{detail_or_gone, store_id, waiter, with_id, Resource};
use crate::resolver;
use crate::schema::{schema, AttributePath, Diagnostics, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::file_storage::{
    CreateFileStorageRequest, FileStorageDetail, SnapshotPolicyRequest, SnapshotSchedule,
};
use crate::tags::{self, tags_field, TAGS};
use crate::validate;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

const TYPE: &str = "scp_file_storage";

pub const PROTOCOLS: &[&str] = &["NFS", "CIFS"];
pub const DISK_TYPES: &[&str] = &["HDD", "SSD"];
pub const FREQUENCIES: &[&str] = &["DAILY", "WEEKLY"];
pub const DAYS: &[&str] = &["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

pub struct FileStorage;

#[derive(Debug, Deserialize)]
struct ScheduleBlock {
    frequency: String,
    #[serde(default)]
    day_of_week: String,
    hour: i64,
}

fn state_of(d: &FileStorageDetail) -> Map<String, Value> {
    let schedule: Vec<Value> = d
        .snapshot_schedule
        .iter()
        .map(|s| json!({"frequency": s.frequency, "day_of_week": s.day_of_week, "hour": s.hour}))
        .collect();
    object(json!({
        "name": d.file_storage_name,
        "protocol": d.file_storage_protocol,
        "disk_type": d.disk_type,
        "encrypted": d.encryption_enabled,
        "snapshot_policy": d.snapshot_policy_enabled,
        "snapshot_retention_count": d.snapshot_retention_count,
        "snapshot_capacity_rate": d.snapshot_capacity_rate,
        "snapshot_schedule": schedule,
        "usage": d.file_storage_usage,
        "service_zone_id": d.service_zone_id,
        "state": d.file_storage_state,
        "created_dt": d.created_dt,
    }))
}

fn schedule(data: &ResourceData) -> Result<Option<SnapshotSchedule>> {
    let blocks: Vec<ScheduleBlock> = data.decode_field("snapshot_schedule")?.unwrap_or_default();
    Ok(blocks.into_iter().next().map(|b| SnapshotSchedule {
        frequency: b.frequency,
        day_of_week: b.day_of_week,
        hour: b.hour,
    }))
}

fn policy_request(data: &ResourceData) -> Result<SnapshotPolicyRequest> {
    let enabled = data.get_bool("snapshot_policy");
    Ok(SnapshotPolicyRequest {
        snapshot_policy_enabled: enabled,
        snapshot_retention_count: enabled
            .then(|| data.get_i64("snapshot_retention_count"))
            .flatten(),
        snapshot_schedule: if enabled { schedule(data)? } else { None },
    })
}

impl FileStorage {
    async fn wait(
        &self,
        ctx: &Context,
        client: &ScpClient,
        id: &str,
        pending: &[&str],
        target: &[&str],
        timeout: Duration,
    ) -> Result<()> {
        converge(ctx, waiter(TYPE, id, pending, target, timeout), GonePolicy::NotFound, || async move {
            let d = client.file_storage().get(ctx, id).await;
            d.map(|d| {
                let s = d.file_storage_state.clone();
                (d, s)
            })
        })
        .await
    }
}

#[async_trait]
impl Resource for FileStorage {
    fn type_name(&self) -> &'static str {
        TYPE
    }

    fn schema(&self) -> Schema {
        schema([
            (
                "name",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::regex_match(
                        r"^[a-z][a-z0-9_]{2,20}$",
                        "must be 3-21 lowercase letters, digits or '_' starting with a letter",
                    )),
            ),
            ("region", Field::string().required().force_new()),
            (
                "protocol",
                Field::string()
                    .required()
                    .force_new()
                    .validate(validate::string_in(PROTOCOLS)),
            ),
            (
                "disk_type",
                Field::string()
                    .optional()
                    .force_new()
                    .default_value("HDD")
                    .validate(validate::string_in(DISK_TYPES)),
            ),
            (
                "encrypted",
                Field::bool().optional().force_new().default_value(false),
            ),
            (
                "cifs_password",
                Field::string()
                    .optional()
                    .sensitive()
                    .force_new()
                    .validate(validate::string_len_between(6, 20)),
            ),
            ("snapshot_policy", Field::bool().optional().default_value(false)),
            (
                "snapshot_retention_count",
                Field::int()
                    .optional()
                    .validate(validate::int_between(1, 128)),
            ),
            (
                "snapshot_capacity_rate",
                Field::int()
                    .optional()
                    .default_value(100)
                    .validate(validate::int_between_step(100, 500, 50))
                    .describe("Percentage of the share reserved for snapshots"),
            ),
            (
                "snapshot_schedule",
                Field::list_block(schema([
                    (
                        "frequency",
                        Field::string()
                            .required()
                            .validate(validate::string_in(FREQUENCIES)),
                    ),
                    (
                        "day_of_week",
                        Field::string().optional().validate(validate::string_in(DAYS)),
                    ),
                    (
                        "hour",
                        Field::int().required().validate(validate::int_between(0, 23)),
                    ),
                ]))
                .optional()
                .max_items(1),
            ),
            ("usage", Field::int().computed()),
            ("service_zone_id", Field::string().computed()),
            ("state", Field::string().computed()),
            ("created_dt", Field::string().computed()),
            (TAGS, tags_field()),
        ])
    }

    fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let root = AttributePath::root();
        let policy = data.get_bool("snapshot_policy");

        if !policy {
            for key in ["snapshot_schedule", "snapshot_retention_count"] {
                if data.get(key).is_some_and(|v| !v.is_array() || !data.get_list(key).is_empty()) {
                    diags.error(&root.key(key), "requires snapshot_policy = true");
                }
            }
        }

        match schedule(data) {
            Ok(Some(s)) => {
                let path = root.key("snapshot_schedule").index(0).key("day_of_week");
                if s.frequency == "WEEKLY" && s.day_of_week.is_empty() {
                    diags.error(&path, "a WEEKLY schedule needs day_of_week");
                } else if s.frequency == "DAILY" && !s.day_of_week.is_empty() {
                    diags.error(&path, "a DAILY schedule takes no day_of_week");
                }
            }
            Ok(None) if policy => {
                diags.error(&root.key("snapshot_schedule"), "required when snapshot_policy = true")
            }
            _ => {}
        }

        let cifs = data.get_str("protocol") == Some("CIFS");
        let has_password = data.get_str("cifs_password").is_some();
        if cifs && !has_password {
            diags.error(&root.key("cifs_password"), "required for CIFS shares");
        } else if !cifs && has_password {
            diags.error(&root.key("cifs_password"), "only valid for CIFS shares");
        }
        diags
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let zone_id = resolver::resolve_zone(ctx, client, &data.get_string("region")).await?;
        let policy = policy_request(data)?;
        let req = CreateFileStorageRequest {
            file_storage_name: data.get_string("name"),
            file_storage_protocol: data.get_string("protocol"),
            disk_type: data.get_string("disk_type"),
            service_zone_id: zone_id,
            encryption_enabled: data.get_bool("encrypted"),
            cifs_password: data.get_str("cifs_password").map(str::to_string),
            snapshot_policy_enabled: policy.snapshot_policy_enabled,
            snapshot_retention_count: policy.snapshot_retention_count,
            snapshot_capacity_rate: data.get_i64("snapshot_capacity_rate").unwrap_or(100),
            snapshot_schedule: policy.snapshot_schedule,
            tags: tags::to_tags(data.get(TAGS)),
        };
        let ack = client.file_storage().create(ctx, &req).await?;
        let id = store_id(data, TYPE, &ack)?;
        let timeout = self.timeouts().for_create(client);
        self.wait(ctx, client, &id, &[state::CREATING], &[state::ACTIVE], timeout)
            .await
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let Some(detail) =
            detail_or_gone(data, self.gone_policy(), client.file_storage().get(ctx, &id)).await?
        else {
            return Ok(());
        };
        let mut fields = state_of(&detail);
        if !detail.snapshot_policy_enabled {
            fields.remove("snapshot_retention_count");
        }
        data.set_map(fields);
        if data.get_str("region").is_none() {
            let region = resolver::zone_location(ctx, client, &detail.service_zone_id).await?;
            data.set("region", region);
        }
        Ok(())
    }

    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let timeout = self.timeouts().for_update(client);

        if ["snapshot_policy", "snapshot_retention_count", "snapshot_schedule"]
            .iter()
            .any(|k| data.has_change(k))
        {
            let req = policy_request(data)?;
            client
                .file_storage()
                .update_snapshot_policy(ctx, &id, &req)
                .await?;
            self.wait(ctx, client, &id, &[state::EDITING], &[state::ACTIVE], timeout)
                .await?;
        }

        if data.has_change("snapshot_capacity_rate") {
            let rate = data.get_i64("snapshot_capacity_rate").unwrap_or(100);
            client
                .file_storage()
                .update_capacity_rate(ctx, &id, rate)
                .await?;
            self.wait(ctx, client, &id, &[state::EDITING], &[state::ACTIVE], timeout)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        client.file_storage().delete(ctx, &id).await?;
        let timeout = self.timeouts().for_delete(client);
        self.wait(
            ctx,
            client,
            &id,
            &[state::ACTIVE, state::DELETING, state::TERMINATING],
            &[state::DELETED],
            timeout,
        )
        .await
    }

    async fn list(&self, ctx: &Context, client: &ScpClient, _args: &ResourceData) -> Result<Vec<Value>> {
        let resp = all_pages(|page| async move {
            client.file_storage().list(ctx, None, page).await
        })
        .await?;
        Ok(resp
            .contents
            .iter()
            .map(|d| with_id(state_of(d), &d.file_storage_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing;

    fn base() -> Value {
        json!({"name": "share01", "region": "KR-WEST-1", "protocol": "NFS"})
    }

    #[test]
    fn test_schedule_requires_policy() {
        let mut config = base();
        config["snapshot_schedule"] = json!([{"frequency": "DAILY", "hour": 3}]);
        let diags = testing::validate(FileStorage, config.clone());
        assert!(diags.to_string().contains("requires snapshot_policy = true"));

        config["snapshot_policy"] = json!(true);
        let diags = testing::validate(FileStorage, config);
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_policy_requires_schedule() {
        let mut config = base();
        config["snapshot_policy"] = json!(true);
        let diags = testing::validate(FileStorage, config);
        assert!(diags.to_string().contains("snapshot_schedule"));
    }

    #[test]
    fn test_weekly_needs_day() {
        let mut config = base();
        config["snapshot_policy"] = json!(true);
        config["snapshot_schedule"] = json!([{"frequency": "WEEKLY", "hour": 3}]);
        let diags = testing::validate(FileStorage, config);
        assert!(diags.to_string().contains("snapshot_schedule.0.day_of_week"));
    }

    #[test]
    fn test_capacity_rate_step() {
        for (rate, ok) in [(100, true), (250, true), (500, true), (275, false), (550, false), (50, false)] {
            let mut config = base();
            config["snapshot_capacity_rate"] = json!(rate);
            let diags = testing::validate(FileStorage, config);
            assert_eq!(diags.is_empty(), ok, "{}: {}", rate, diags);
        }
    }

    #[test]
    fn test_cifs_password() {
        let mut config = base();
        config["protocol"] = json!("CIFS");
        assert!(testing::validate(FileStorage, config.clone())
            .to_string()
            .contains("cifs_password"));
        config["cifs_password"] = json!("secret123");
        assert!(testing::validate(FileStorage, config).is_empty());
    }

    #[test]
    fn test_disabled_policy_sends_no_schedule() {
        let data = testing::data(
            &FileStorage,
            None,
            Some(json!({"name": "share01", "snapshot_policy": false, "snapshot_retention_count": 3})),
        );
        let req = policy_request(&data).unwrap();
        assert!(!req.snapshot_policy_enabled);
        assert!(req.snapshot_retention_count.is_none());
        assert!(req.snapshot_schedule.is_none());
    }
}
