//! Firewalls
//!
//! Firewalls are created by internet gateways rather than managed directly,
//! so they are only published as a list.

use crate::context::Context;
use crate::convert::to_list;
use crate::error::Result;
use crate::filter::{self, filter_field, Filter};
use crate::provider::lifecycle::DataSource;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::{all_pages, ScpClient};
use crate::service::firewall::ListFirewalls;
use async_trait::async_trait;
use serde_json::Value;

use super::generic::{CONTENTS, FILTER, TOTAL_COUNT};

pub struct Firewalls;

impl Firewalls {
    fn item_schema() -> Schema {
        schema([
            ("firewall_id", Field::string().computed()),
            ("firewall_name", Field::string().computed()),
            ("firewall_state", Field::string().computed()),
            ("is_loggable", Field::bool().computed()),
            ("object_id", Field::string().computed()),
            ("object_type", Field::string().computed()),
            ("vpc_id", Field::string().computed()),
            ("product_type", Field::string().computed()),
            ("created_dt", Field::string().computed()),
        ])
    }
}

#[async_trait]
impl DataSource for Firewalls {
    fn type_name(&self) -> String {
        "scp_firewalls".to_string()
    }

    fn schema(&self) -> Schema {
        schema([
            ("vpc_id", Field::string().optional()),
            ("object_id", Field::string().optional().describe("ID of the gateway owning the firewall")),
            (FILTER, filter_field()),
            (CONTENTS, Field::list_block(Self::item_schema()).computed()),
            (TOTAL_COUNT, Field::int().computed()),
        ])
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let filters: Vec<Filter> = data.decode_field(FILTER)?.unwrap_or_default();
        let vpc_id = data.get_str("vpc_id").map(str::to_string);
        let object_id = data.get_str("object_id").map(str::to_string);
        let opts = ListFirewalls {
            vpc_id: vpc_id.as_deref(),
            object_id: object_id.as_deref(),
            ..Default::default()
        };
        let resp = all_pages(|page| async move {
            client.firewall().list(ctx, &ListFirewalls { page, ..opts }).await
        })
        .await?;
        let items = filter::apply(to_list(&resp.contents)?, &filters, &Self::item_schema())?;
        data.set(TOTAL_COUNT, items.len());
        data.set(CONTENTS, Value::Array(items));
        data.set_id(uuid::Uuid::new_v4().to_string());
        Ok(())
    }
}
