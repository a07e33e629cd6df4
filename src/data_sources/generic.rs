//! Data sources derived from managed resource types
//!
//! Every managed type `scp_<x>` is also published read-only twice: as a list
//! (`scp_<x>s`) with client-side filters, and as a singular lookup by ID
//! (`scp_<x>`). Both reuse the resource's own schema through
//! [`as_data_source`], so no field is declared twice.

use crate::context::Context;
use crate::convert::as_data_source;
use crate::error::{Error, Result};
use crate::filter::{self, filter_field, Filter};
use crate::provider::lifecycle::{DataSource, Resource};
use crate::schema::{Field, ResourceData, Schema};
use crate::scp::ScpClient;
use crate::tags::{self, TAGS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const FILTER: &str = "filter";
pub const CONTENTS: &str = "contents";
pub const TOTAL_COUNT: &str = "total_count";

/// Schema of one listed item: the read-only dual plus its ID
pub fn item_schema(resource: &dyn Resource) -> Schema {
    let mut schema = as_data_source(&resource.schema());
    schema.insert("id".to_string(), Field::string().computed());
    schema
}

/// `scp_<type>s`: every instance visible to the project, filtered
pub struct ListDataSource {
    resource: Arc<dyn Resource>,
    items: Schema,
}

impl ListDataSource {
    pub fn new(resource: Arc<dyn Resource>) -> Self {
        let items = item_schema(resource.as_ref());
        Self { resource, items }
    }
}

#[async_trait]
impl DataSource for ListDataSource {
    fn type_name(&self) -> String {
        format!("{}s", self.resource.type_name())
    }

    fn schema(&self) -> Schema {
        let mut schema = self.resource.list_schema();
        schema.insert(FILTER.to_string(), filter_field());
        schema.insert(
            CONTENTS.to_string(),
            Field::list_block(self.items.clone())
                .computed()
                .describe("Matching instances"),
        );
        schema.insert(TOTAL_COUNT.to_string(), Field::int().computed());
        schema
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let filters: Vec<Filter> = data.decode_field(FILTER)?.unwrap_or_default();
        let items = self.resource.list(ctx, client, data).await?;
        let fetched = items.len();
        let items = filter::apply(items, &filters, &self.items)?;

        tracing::debug!(
            "{}: {} of {} items matched {} filter(s)",
            self.type_name(),
            items.len(),
            fetched,
            filters.len()
        );

        data.set(TOTAL_COUNT, items.len());
        data.set(CONTENTS, Value::Array(items));
        data.set_id(uuid::Uuid::new_v4().to_string());
        Ok(())
    }
}

/// `scp_<type>`: one existing instance looked up by ID
pub struct LookupDataSource {
    resource: Arc<dyn Resource>,
}

impl LookupDataSource {
    pub fn new(resource: Arc<dyn Resource>) -> Self {
        Self { resource }
    }
}

#[async_trait]
impl DataSource for LookupDataSource {
    fn type_name(&self) -> String {
        self.resource.type_name().to_string()
    }

    fn schema(&self) -> Schema {
        let mut schema = as_data_source(&self.resource.schema());
        // parent IDs needed to address the instance stay inputs
        schema.extend(self.resource.list_schema());
        schema.insert("id".to_string(), Field::string().required());
        schema
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let id = data.get_string("id");
        data.set_id(id.clone());
        self.resource.read(ctx, client, data).await?;
        if data.id().is_empty() {
            return Err(Error::resolution(self.resource.type_name(), id));
        }
        if data.schema().contains_key(TAGS) {
            let tags = tags::read(client, ctx, &id).await?;
            data.set(TAGS, tags);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::vpc::Vpc;
    use crate::resources::firewall_rule::FirewallRule;
    use crate::schema::Type;

    #[test]
    fn test_list_schema_shape() {
        let ds = ListDataSource::new(Arc::new(Vpc));
        assert_eq!(ds.type_name(), "scp_vpcs");
        let schema = ds.schema();
        assert!(schema[FILTER].optional);
        assert!(schema[TOTAL_COUNT].is_computed_only());
        let items = schema[CONTENTS].block().unwrap();
        assert!(items["id"].computed);
        assert!(items["name"].is_computed_only());
        assert!(matches!(schema[CONTENTS].ty(), Type::List(_)));
    }

    #[test]
    fn test_lookup_schema_requires_id() {
        let ds = LookupDataSource::new(Arc::new(Vpc));
        assert_eq!(ds.type_name(), "scp_vpc");
        let schema = ds.schema();
        assert!(schema["id"].required);
        assert!(schema["region"].is_computed_only());
    }

    #[test]
    fn test_lookup_keeps_parent_id_as_input() {
        let schema = LookupDataSource::new(Arc::new(FirewallRule)).schema();
        assert!(schema["firewall_id"].required);
        assert!(schema["direction"].is_computed_only());
        let list = ListDataSource::new(Arc::new(FirewallRule)).schema();
        assert!(list["firewall_id"].required);
    }
}
