//! Resource lifecycle
//!
//! The [`Resource`] trait is the capability set every managed type
//! implements: create, read, update, delete, plus cross-field validation.
//! [`ResourceEntry`] is the one shared driver around it. The driver owns
//! everything that is the same for all types: schema validation, planning
//! (defaults, diff suppression, `force_new` replacement, `immutable`
//! rejection), create-then-read, update-then-tags-then-read, tolerant
//! deletes, and the read-side tag helper. Adapters only talk to their API.

use crate::context::Context;
use crate::error::{translate, Error, GonePolicy, Result};
use crate::poll::Waiter;
use crate::schema::data::normalized;
use crate::schema::{
    apply_defaults, validate_object, AttributePath, Diagnostics, ResourceData, Schema,
};
use crate::scp::{AsyncResponse, ScpClient};
use crate::tags::{self, TAGS};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Per-operation convergence windows; `None` uses the provider default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

impl Timeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: Some(timeout),
            update: Some(timeout),
            delete: Some(timeout),
        }
    }

    pub fn for_create(&self, client: &ScpClient) -> Duration {
        self.create.unwrap_or_else(|| client.default_timeout())
    }

    pub fn for_update(&self, client: &ScpClient) -> Duration {
        self.update.unwrap_or_else(|| client.default_timeout())
    }

    pub fn for_delete(&self, client: &ScpClient) -> Duration {
        self.delete.unwrap_or_else(|| client.default_timeout())
    }
}

/// A managed resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Registered type name, e.g. `scp_vpc`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Which statuses mean the resource is gone
    fn gone_policy(&self) -> GonePolicy {
        GonePolicy::NotFound
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Cross-field checks that single-field validators cannot express
    fn validate(&self, _data: &ResourceData) -> Diagnostics {
        Diagnostics::new()
    }

    /// Submit the create call, store the new ID, and wait for convergence
    async fn create(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()>;

    /// Copy the cloud's view into `data`; clear the ID if the resource is gone
    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()>;

    /// Call the granular update endpoint of every changed field
    async fn update(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()>;

    /// Submit the delete call and wait until the resource is gone
    async fn delete(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()>;

    /// Extra inputs a listing needs, such as a parent ID
    fn list_schema(&self) -> Schema {
        Schema::new()
    }

    /// All instances visible to the project, shaped like this type's state
    /// plus `id`
    async fn list(&self, ctx: &Context, client: &ScpClient, args: &ResourceData) -> Result<Vec<Value>>;
}

// ============================================================================
// Adapter helpers
// ============================================================================

/// Run the detail call of a read; a deleted-equivalent failure clears the ID
pub async fn detail_or_gone<T, Fut>(
    data: &mut ResourceData,
    policy: GonePolicy,
    fut: Fut,
) -> Result<Option<T>>
where
    Fut: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_deleted_equivalent(policy) => {
            tracing::warn!(
                "{} no longer exists (status {}), removing from state",
                data.id(),
                e.status()
            );
            data.clear_id();
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Record the ID of a submitted create
pub fn store_id(data: &mut ResourceData, type_name: &str, ack: &AsyncResponse) -> Result<String> {
    if ack.resource_id.is_empty() {
        return Err(Error::Precondition(format!(
            "create of {} returned no resource ID",
            type_name
        )));
    }
    tracing::info!(
        "submitted create of {} {} (request {})",
        type_name,
        ack.resource_id,
        ack.request_id
    );
    data.set_id(ack.resource_id.clone());
    Ok(ack.resource_id.clone())
}

/// Waiter for one resource instance
pub fn waiter(type_name: &str, id: &str, pending: &[&str], target: &[&str], timeout: Duration) -> Waiter {
    Waiter::new(format!("{} {}", type_name, id), pending, target).timeout(timeout)
}

/// A state map with `id` added, as listings return it
pub fn with_id(mut state: Map<String, Value>, id: &str) -> Value {
    state.insert("id".to_string(), Value::String(id.to_string()));
    Value::Object(state)
}

// ============================================================================
// Driver
// ============================================================================

/// Result of planning one change
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// `None` plans a destroy
    pub planned_state: Option<Value>,
    /// Changed `force_new` attributes; non-empty means destroy-create
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

impl Plan {
    pub fn requires_replace(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

/// New state for the host plus diagnostics
#[derive(Debug, Clone, Default)]
pub struct StateResponse {
    /// `None` removes the instance from state
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl StateResponse {
    fn ok(state: Option<Value>) -> Self {
        Self {
            state,
            diagnostics: Diagnostics::new(),
        }
    }

    fn failed(state: Option<Value>, err: Error) -> Self {
        Self {
            state,
            diagnostics: Diagnostics::from(translate(err)),
        }
    }

    fn invalid(diagnostics: Diagnostics, state: Option<Value>) -> Self {
        Self { state, diagnostics }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Registered resource type with its schema
pub struct ResourceEntry {
    resource: Arc<dyn Resource>,
    schema: Arc<Schema>,
}

impl ResourceEntry {
    pub fn new(resource: Arc<dyn Resource>) -> Self {
        let schema = Arc::new(resource.schema());
        Self { resource, schema }
    }

    pub fn type_name(&self) -> &'static str {
        self.resource.type_name()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn resource(&self) -> &Arc<dyn Resource> {
        &self.resource
    }

    pub fn has_tags(&self) -> bool {
        self.schema.contains_key(TAGS)
    }

    /// Schema and cross-field checks of one configuration
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let Some(obj) = config.as_object() else {
            let mut diags = Diagnostics::new();
            diags.error(&AttributePath::root(), "configuration must be an object");
            return diags;
        };
        let mut diags = validate_object(&self.schema, obj, &AttributePath::root());
        if !diags.has_errors() {
            let data = ResourceData::new(self.schema.clone(), None, Some(config));
            diags.extend(self.resource.validate(&data));
        }
        diags
    }

    /// Validate the user-settable part of a planned state
    ///
    /// Planning carries cloud-assigned fields over from the prior state, so
    /// computed-only fields are left out before the configuration checks.
    fn validate_planned(&self, planned: &Value) -> Diagnostics {
        let mut config = planned.as_object().cloned().unwrap_or_default();
        config.retain(|name, _| {
            self.schema
                .get(name)
                .map_or(true, |field| !field.is_computed_only())
        });
        self.validate(&Value::Object(config))
    }

    /// Plan the transition from `prior` to `proposed`
    pub fn plan(&self, prior: Option<&Value>, proposed: Option<&Value>) -> Plan {
        let mut plan = Plan::default();
        let Some(proposed) = present(proposed) else {
            return plan;
        };

        plan.diagnostics = self.validate(proposed);
        if plan.diagnostics.has_errors() {
            return plan;
        }

        let mut planned = proposed.as_object().cloned().unwrap_or_default();
        apply_defaults(&self.schema, &mut planned);
        planned.remove("id");

        let Some(prior) = present(prior).and_then(Value::as_object) else {
            plan.planned_state = Some(Value::Object(planned));
            return plan;
        };

        let mut carried = Vec::new();
        for (name, field) in self.schema.iter() {
            let old = present(prior.get(name));
            let new = present(planned.get(name));

            if new.is_none() && field.computed {
                if let Some(old) = old {
                    planned.insert(name.clone(), old.clone());
                    carried.push(name.clone());
                }
                continue;
            }

            if let (Some(o), Some(n), Some(suppress)) = (old, new, field.diff_suppress) {
                if o != n && suppress(name, o, n) {
                    planned.insert(name.clone(), o.clone());
                    continue;
                }
            }

            if normalized(old) == normalized(new) {
                continue;
            }

            let path = AttributePath::root().key(name);
            if field.immutable {
                plan.diagnostics
                    .error(&path, format!("'{}' cannot be changed after creation", name));
            } else if field.force_new {
                plan.requires_replace.push(path);
            }
        }

        if plan.requires_replace() {
            // a replacement starts over: cloud-assigned values are unknown again
            for name in carried {
                planned.remove(&name);
            }
        } else if let Some(id) = prior.get("id") {
            planned.insert("id".to_string(), id.clone());
        }

        plan.planned_state = Some(Value::Object(planned));
        plan
    }

    /// Create, update or delete depending on which states are present
    pub async fn apply(
        &self,
        ctx: &Context,
        client: &ScpClient,
        prior: Option<&Value>,
        planned: Option<&Value>,
    ) -> StateResponse {
        match (present(prior), present(planned)) {
            (None, Some(planned)) => self.create(ctx, client, planned).await,
            (Some(prior), Some(planned)) => self.update(ctx, client, prior, planned).await,
            (Some(prior), None) => self.delete(ctx, client, prior).await,
            (None, None) => {
                let mut diags = Diagnostics::new();
                diags.error(&AttributePath::root(), "nothing to apply: no prior or planned state");
                StateResponse::invalid(diags, None)
            }
        }
    }

    async fn read_into(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        self.resource.read(ctx, client, data).await?;
        if self.has_tags() && !data.id().is_empty() {
            let tags = tags::read(client, ctx, data.id()).await?;
            data.set(TAGS, tags);
        }
        Ok(())
    }

    async fn create_then_read(
        &self,
        ctx: &Context,
        client: &ScpClient,
        data: &mut ResourceData,
    ) -> Result<()> {
        self.resource.create(ctx, client, data).await?;
        let id = data.id().to_string();
        self.read_into(ctx, client, data).await?;
        if data.id().is_empty() {
            return Err(Error::Precondition(format!(
                "{} {} disappeared right after creation",
                self.type_name(),
                id
            )));
        }
        Ok(())
    }

    async fn update_then_read(
        &self,
        ctx: &Context,
        client: &ScpClient,
        data: &mut ResourceData,
    ) -> Result<()> {
        self.resource.update(ctx, client, data).await?;
        if self.has_tags() {
            let before = data.prior(TAGS).cloned();
            let after = data.get(TAGS).cloned();
            tags::reconcile(client, ctx, data.id(), before.as_ref(), after.as_ref()).await?;
        }
        self.read_into(ctx, client, data).await
    }

    async fn create(&self, ctx: &Context, client: &ScpClient, planned: &Value) -> StateResponse {
        let diags = self.validate_planned(planned);
        if diags.has_errors() {
            return StateResponse::invalid(diags, None);
        }

        let mut config = planned.as_object().cloned().unwrap_or_default();
        apply_defaults(&self.schema, &mut config);
        let config = Value::Object(config);
        let mut data = ResourceData::new(self.schema.clone(), None, Some(&config));
        data.clear_id();

        tracing::info!("creating {}", self.type_name());
        match self.create_then_read(ctx, client, &mut data).await {
            Ok(()) => {
                tracing::info!("created {} {}", self.type_name(), data.id());
                StateResponse::ok(data.state())
            }
            Err(e) => {
                tracing::error!("create of {} failed: {}", self.type_name(), e);
                // keep a partially created instance in state so it can be destroyed
                StateResponse::failed(data.state(), e)
            }
        }
    }

    async fn update(
        &self,
        ctx: &Context,
        client: &ScpClient,
        prior: &Value,
        planned: &Value,
    ) -> StateResponse {
        let diags = self.validate_planned(planned);
        if diags.has_errors() {
            return StateResponse::invalid(diags, Some(prior.clone()));
        }

        let mut data = ResourceData::new(self.schema.clone(), Some(prior), Some(planned));
        tracing::info!("updating {} {}", self.type_name(), data.id());

        match self.update_then_read(ctx, client, &mut data).await {
            Ok(()) => StateResponse::ok(data.state()),
            Err(e) => {
                tracing::error!("update of {} {} failed: {}", self.type_name(), data.id(), e);
                StateResponse::failed(Some(prior.clone()), e)
            }
        }
    }

    async fn delete(&self, ctx: &Context, client: &ScpClient, prior: &Value) -> StateResponse {
        let mut data = ResourceData::new(self.schema.clone(), Some(prior), None);
        if data.id().is_empty() {
            return StateResponse::ok(None);
        }
        tracing::info!("deleting {} {}", self.type_name(), data.id());

        match self.resource.delete(ctx, client, &mut data).await {
            Ok(()) => StateResponse::ok(None),
            Err(e) if e.is_deleted_equivalent(self.resource.gone_policy()) => {
                self.confirm_gone(ctx, client, data, prior, e).await
            }
            Err(e) => {
                tracing::error!("delete of {} {} failed: {}", self.type_name(), data.id(), e);
                StateResponse::failed(Some(prior.clone()), e)
            }
        }
    }

    /// Settle a delete call that answered with a deleted-equivalent status
    ///
    /// The status may come from a collection endpoint or a missing parent, so
    /// the instance only counts as gone once its own read agrees.
    async fn confirm_gone(
        &self,
        ctx: &Context,
        client: &ScpClient,
        mut data: ResourceData,
        prior: &Value,
        err: Error,
    ) -> StateResponse {
        let id = data.id().to_string();
        match self.resource.read(ctx, client, &mut data).await {
            Ok(()) if data.id().is_empty() => {
                tracing::warn!(
                    "{} {} already gone (status {})",
                    self.type_name(),
                    id,
                    err.status()
                );
                StateResponse::ok(None)
            }
            Ok(()) => {
                tracing::error!(
                    "delete of {} {} answered {} but the instance still exists",
                    self.type_name(),
                    id,
                    err.status()
                );
                StateResponse::failed(Some(prior.clone()), err)
            }
            Err(read_err) => {
                tracing::error!(
                    "delete of {} {} failed ({}); confirming read failed: {}",
                    self.type_name(),
                    id,
                    err,
                    read_err
                );
                StateResponse::failed(Some(prior.clone()), err)
            }
        }
    }

    /// Refresh one instance; `None` state means it no longer exists
    pub async fn read(&self, ctx: &Context, client: &ScpClient, current: &Value) -> StateResponse {
        let mut data = ResourceData::new(self.schema.clone(), Some(current), None);
        if data.id().is_empty() {
            return StateResponse::ok(None);
        }
        match self.read_into(ctx, client, &mut data).await {
            Ok(()) => StateResponse::ok(data.state()),
            Err(e) => StateResponse::failed(Some(current.clone()), e),
        }
    }
}

// ============================================================================
// Data sources
// ============================================================================

/// A read-only data source type
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> String;

    fn schema(&self) -> Schema;

    /// Populate `data` and give it an ID
    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()>;
}

/// Registered data source type with its schema
pub struct DataSourceEntry {
    source: Box<dyn DataSource>,
    name: String,
    schema: Arc<Schema>,
}

impl DataSourceEntry {
    pub fn new(source: Box<dyn DataSource>) -> Self {
        let schema = Arc::new(source.schema());
        let name = source.type_name();
        Self {
            source,
            name,
            schema,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn validate(&self, config: &Value) -> Diagnostics {
        match config.as_object() {
            Some(obj) => validate_object(&self.schema, obj, &AttributePath::root()),
            None => {
                let mut diags = Diagnostics::new();
                diags.error(&AttributePath::root(), "configuration must be an object");
                diags
            }
        }
    }

    pub async fn read(&self, ctx: &Context, client: &ScpClient, config: &Value) -> StateResponse {
        let diags = self.validate(config);
        if diags.has_errors() {
            return StateResponse::invalid(diags, None);
        }

        let mut obj = config.as_object().cloned().unwrap_or_default();
        apply_defaults(&self.schema, &mut obj);
        let config = Value::Object(obj);
        let mut data = ResourceData::new(self.schema.clone(), None, Some(&config));

        tracing::debug!("reading data source {}", self.name);
        match self.source.read(ctx, client, &mut data).await {
            Ok(()) => StateResponse::ok(data.state()),
            Err(e) => StateResponse::failed(None, e),
        }
    }
}
