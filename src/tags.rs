//! Tag reconciliation
//!
//! Tags are a property of every taggable resource, reconciled separately from
//! its other fields. The desired set replaces the prior set by detaching each
//! removed or changed pair by key, then attaching all new pairs in one call.
//! Equal sets produce no API calls at all.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::scp::{ScpClient, Tag};
use crate::schema::Field;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the tag field in every taggable schema
pub const TAGS: &str = "tags";

/// Schema declaration of the `tags` map
pub fn tags_field() -> Field {
    Field::map()
        .optional()
        .describe("Key/value tags; keys are unique per resource")
}

/// Tag operations the reconciler needs
#[async_trait]
pub trait TagApi: Send + Sync {
    async fn list(&self, ctx: &Context, resource_id: &str) -> Result<Vec<Tag>>;
    async fn detach(&self, ctx: &Context, resource_id: &str, key: &str) -> Result<()>;
    async fn attach(&self, ctx: &Context, resource_id: &str, tags: &[Tag]) -> Result<()>;
}

#[async_trait]
impl TagApi for ScpClient {
    async fn list(&self, ctx: &Context, resource_id: &str) -> Result<Vec<Tag>> {
        self.tag().list(ctx, resource_id).await
    }

    async fn detach(&self, ctx: &Context, resource_id: &str, key: &str) -> Result<()> {
        self.tag().detach(ctx, resource_id, key).await
    }

    async fn attach(&self, ctx: &Context, resource_id: &str, tags: &[Tag]) -> Result<()> {
        self.tag().attach(ctx, resource_id, tags).await
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Canonical pair set from the host's map representation, unique by key
pub fn from_value(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.clone(), scalar_string(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Host map representation of a tag list
pub fn to_value(tags: &[Tag]) -> Value {
    let map: Map<String, Value> = tags
        .iter()
        .map(|t| (t.tag_key.clone(), Value::String(t.tag_value.clone())))
        .collect();
    Value::Object(map)
}

/// Request representation of the host map
pub fn to_tags(value: Option<&Value>) -> Vec<Tag> {
    from_value(value)
        .into_iter()
        .map(|(k, v)| Tag::new(k, v))
        .collect()
}

/// Pairs to detach and pairs to attach
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub remove: Vec<Tag>,
    pub add: Vec<Tag>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// `prior \ desired` and `desired \ prior`, compared as exact pairs
pub fn diff(prior: &BTreeMap<String, String>, desired: &BTreeMap<String, String>) -> TagDiff {
    let remove = prior
        .iter()
        .filter(|(k, v)| desired.get(*k) != Some(*v))
        .map(|(k, v)| Tag::new(k.clone(), v.clone()))
        .collect();
    let add = desired
        .iter()
        .filter(|(k, v)| prior.get(*k) != Some(*v))
        .map(|(k, v)| Tag::new(k.clone(), v.clone()))
        .collect();
    TagDiff { remove, add }
}

/// Bring the tags on `resource_id` from `prior` to `desired`
///
/// The first failing call aborts the reconcile.
pub async fn reconcile(
    api: &dyn TagApi,
    ctx: &Context,
    resource_id: &str,
    prior: Option<&Value>,
    desired: Option<&Value>,
) -> Result<()> {
    let changes = diff(&from_value(prior), &from_value(desired));
    if changes.is_empty() {
        return Ok(());
    }

    tracing::info!(
        "reconciling tags on {}: {} to detach, {} to attach",
        resource_id,
        changes.remove.len(),
        changes.add.len()
    );

    for tag in &changes.remove {
        api.detach(ctx, resource_id, &tag.tag_key)
            .await
            .map_err(|e| Error::Tag {
                action: "detach",
                resource_id: resource_id.to_string(),
                key: tag.tag_key.clone(),
                source: Box::new(e),
            })?;
    }

    if !changes.add.is_empty() {
        api.attach(ctx, resource_id, &changes.add)
            .await
            .map_err(|e| Error::Tag {
                action: "attach",
                resource_id: resource_id.to_string(),
                key: changes
                    .add
                    .iter()
                    .map(|t| t.tag_key.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                source: Box::new(e),
            })?;
    }

    Ok(())
}

/// Current tags of a resource in the host's map representation
pub async fn read(api: &dyn TagApi, ctx: &Context, resource_id: &str) -> Result<Value> {
    let tags = api.list(ctx, resource_id).await?;
    Ok(to_value(&tags))
}
