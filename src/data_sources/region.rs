//! Regions
//!
//! The service zones of the configured project, one per region name.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::filter::{self, filter_field, Filter};
use crate::provider::lifecycle::DataSource;
use crate::schema::{schema, Field, ResourceData, Schema, Type};
use crate::scp::ScpClient;
use crate::service::project::ServiceZone;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::generic::{CONTENTS, FILTER, TOTAL_COUNT};

fn zone_fields() -> Schema {
    schema([
        ("service_zone_id", Field::string().computed()),
        ("service_zone_name", Field::string().computed()),
        ("block_id", Field::string().computed()),
        ("is_multi_availability_zone", Field::bool().computed()),
        ("availability_zones", Field::list_of(Type::String).computed()),
    ])
}

fn zone_value(zone: &ServiceZone) -> Value {
    let azs: Vec<&str> = zone
        .availability_zones
        .iter()
        .map(|az| az.availability_zone_name.as_str())
        .collect();
    json!({
        "name": zone.service_zone_location,
        "service_zone_id": zone.service_zone_id,
        "service_zone_name": zone.service_zone_name,
        "block_id": zone.block_id,
        "is_multi_availability_zone": zone.is_multi_availability_zone,
        "availability_zones": azs,
    })
}

/// `scp_region`: one region by name
pub struct Region;

#[async_trait]
impl DataSource for Region {
    fn type_name(&self) -> String {
        "scp_region".to_string()
    }

    fn schema(&self) -> Schema {
        let mut s = zone_fields();
        s.insert(
            "name".to_string(),
            Field::string().required().describe("Region name, e.g. KR-WEST-1"),
        );
        s
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let name = data.get_string("name");
        let zone = crate::resolver::find_zone(ctx, client, &name).await?;
        if let Value::Object(map) = zone_value(&zone) {
            data.set_map(map);
        }
        data.set_id(zone.service_zone_id);
        Ok(())
    }
}

/// `scp_regions`: every region of the project
pub struct Regions;

impl Regions {
    fn item_schema() -> Schema {
        let mut s = zone_fields();
        s.insert("name".to_string(), Field::string().computed());
        s
    }
}

#[async_trait]
impl DataSource for Regions {
    fn type_name(&self) -> String {
        "scp_regions".to_string()
    }

    fn schema(&self) -> Schema {
        schema([
            (FILTER, filter_field()),
            (CONTENTS, Field::list_block(Self::item_schema()).computed()),
            (TOTAL_COUNT, Field::int().computed()),
        ])
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let filters: Vec<Filter> = data.decode_field(FILTER)?.unwrap_or_default();
        let info = client.project().info(ctx).await?;
        if info.project_id.is_empty() && info.service_zones.is_empty() {
            return Err(Error::Precondition("project summary is empty".to_string()));
        }
        let items: Vec<Value> = info.service_zones.iter().map(zone_value).collect();
        let items = filter::apply(items, &filters, &Self::item_schema())?;
        data.set(TOTAL_COUNT, items.len());
        data.set(CONTENTS, Value::Array(items));
        data.set_id(info.project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::project::AvailabilityZone;

    #[test]
    fn test_zone_value_flattens_availability_zones() {
        let zone = ServiceZone {
            service_zone_id: "ZONE-1".into(),
            service_zone_location: "KR-WEST-1".into(),
            availability_zones: vec![
                AvailabilityZone {
                    availability_zone_name: "AZ1".into(),
                },
                AvailabilityZone {
                    availability_zone_name: "AZ2".into(),
                },
            ],
            ..Default::default()
        };
        let v = zone_value(&zone);
        assert_eq!(v["name"], "KR-WEST-1");
        assert_eq!(v["availability_zones"], json!(["AZ1", "AZ2"]));
    }

    #[test]
    fn test_filter_on_availability_zone() {
        let zones = [("Z1", "AZ1"), ("Z2", "AZ2")].map(|(id, az)| {
            zone_value(&ServiceZone {
                service_zone_id: id.into(),
                availability_zones: vec![AvailabilityZone {
                    availability_zone_name: az.into(),
                }],
                ..Default::default()
            })
        });
        let out = filter::apply(
            zones.to_vec(),
            &[Filter::new("availability_zones", vec!["AZ2".into()])],
            &Regions::item_schema(),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["service_zone_id"], "Z2");
    }
}
