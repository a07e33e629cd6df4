//! Product Service
//!
//! Product groups bundle the sellable products (disk types, scales,
//! versions) of one service in one zone.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::ListResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Product type holding scale (cpu/memory) products
pub const PRODUCT_TYPE_SCALE: &str = "SCALE";

/// One attribute of a product, e.g. `cpu = 2`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductItem {
    pub item: String,
    pub item_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub product_type: String,
    pub product_state: String,
    pub items: Vec<ProductItem>,
}

impl Product {
    pub fn item(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|i| i.item == name)
            .map(|i| i.item_value.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductGroup {
    pub product_group_id: String,
    pub product_group_name: String,
    pub product_group_state: String,
    pub target_product_group: String,
    pub target_product: String,
    pub service_zone_id: String,
    /// Products keyed by product type
    pub products: BTreeMap<String, Vec<Product>>,
}

pub struct ProductService<'a> {
    client: &'a ScpClient,
}

impl<'a> ProductService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    /// Product groups available in one zone
    pub async fn list_groups(
        &self,
        ctx: &Context,
        service_zone_id: &str,
        target_product_group: Option<&str>,
        target_product: Option<&str>,
    ) -> Result<ListResponse<ProductGroup>> {
        let query = Query::new()
            .set("serviceZoneId", service_zone_id)
            .opt("targetProductGroup", target_product_group)
            .opt("targetProduct", target_product);
        self.client
            .get(ctx, Service::Product, "v2/product-groups", &query)
            .await
    }

    pub async fn get_group(&self, ctx: &Context, product_group_id: &str) -> Result<ProductGroup> {
        let path = format!("v2/product-groups/{}", seg(product_group_id));
        self.client
            .get(ctx, Service::Product, &path, &Query::new())
            .await
    }
}
