//! Product group lookup

use crate::context::Context;
use crate::error::Result;
use crate::provider::lifecycle::DataSource;
use crate::resolver;
use crate::schema::{schema, Field, ResourceData, Schema};
use crate::scp::ScpClient;
use crate::service::product::ProductGroup;
use async_trait::async_trait;
use serde_json::{json, Value};

/// `scp_product_group`: a product group and its products in one region
pub struct ProductGroupSource;

fn products(group: &ProductGroup) -> Vec<Value> {
    group
        .products
        .iter()
        .flat_map(|(product_type, list)| {
            list.iter().map(move |p| {
                json!({
                    "product_type": product_type,
                    "product_id": p.product_id,
                    "product_name": p.product_name,
                    "product_state": p.product_state,
                })
            })
        })
        .collect()
}

#[async_trait]
impl DataSource for ProductGroupSource {
    fn type_name(&self) -> String {
        "scp_product_group".to_string()
    }

    fn schema(&self) -> Schema {
        schema([
            ("region", Field::string().required()),
            ("group_name", Field::string().required().describe("Target product group, e.g. NETWORK")),
            ("target_product", Field::string().required().describe("Target product, e.g. Kubernetes Engine VM")),
            ("product_group_name", Field::string().computed()),
            ("product_group_state", Field::string().computed()),
            ("service_zone_id", Field::string().computed()),
            (
                "products",
                Field::list_block(schema([
                    ("product_type", Field::string().computed()),
                    ("product_id", Field::string().computed()),
                    ("product_name", Field::string().computed()),
                    ("product_state", Field::string().computed()),
                ]))
                .computed(),
            ),
        ])
    }

    async fn read(&self, ctx: &Context, client: &ScpClient, data: &mut ResourceData) -> Result<()> {
        let zone_id = resolver::resolve_zone(ctx, client, &data.get_string("region")).await?;
        let group = resolver::find_product_group(
            ctx,
            client,
            &zone_id,
            &data.get_string("group_name"),
            &data.get_string("target_product"),
        )
        .await?;
        // the listing may omit products; the detail call carries them
        let group = if group.products.is_empty() {
            client.product().get_group(ctx, &group.product_group_id).await?
        } else {
            group
        };

        data.set("product_group_name", group.product_group_name.clone());
        data.set("product_group_state", group.product_group_state.clone());
        data.set("service_zone_id", zone_id);
        data.set("products", Value::Array(products(&group)));
        data.set_id(group.product_group_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::product::Product;
    use std::collections::BTreeMap;

    #[test]
    fn test_products_flattened_with_type() {
        let mut map = BTreeMap::new();
        map.insert(
            "SCALE".to_string(),
            vec![Product {
                product_id: "P-1".into(),
                product_name: "s1v2m4".into(),
                product_state: "AVAILABLE".into(),
                ..Default::default()
            }],
        );
        map.insert(
            "K8S_VERSION".to_string(),
            vec![Product {
                product_id: "P-2".into(),
                product_name: "v1.29".into(),
                ..Default::default()
            }],
        );
        let group = ProductGroup {
            products: map,
            ..Default::default()
        };
        let out = products(&group);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["product_type"], "K8S_VERSION");
        assert_eq!(out[1]["product_id"], "P-1");
    }
}
