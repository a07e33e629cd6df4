//! Capability resolver
//!
//! Maps the human-facing names users write (region, product group, product,
//! scale tier) to the opaque IDs the API expects. Each resolution fetches
//! the project summary or product catalog and scans it linearly; the first
//! match wins.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::poll::state;
use crate::scp::ScpClient;
use crate::service::product::{Product, ProductGroup, PRODUCT_TYPE_SCALE};
use crate::service::project::ServiceZone;

/// Service zone whose location equals `region`
pub async fn find_zone(ctx: &Context, client: &ScpClient, region: &str) -> Result<ServiceZone> {
    let info = client.project().info(ctx).await?;
    info.service_zones
        .into_iter()
        .find(|z| z.service_zone_location == region)
        .ok_or_else(|| Error::resolution("region", region))
}

/// Region name to service zone ID
pub async fn resolve_zone(ctx: &Context, client: &ScpClient, region: &str) -> Result<String> {
    let zone = find_zone(ctx, client, region).await?;
    tracing::debug!("region {} -> zone {}", region, zone.service_zone_id);
    Ok(zone.service_zone_id)
}

/// Region name of a service zone ID
pub async fn zone_location(ctx: &Context, client: &ScpClient, zone_id: &str) -> Result<String> {
    let info = client.project().info(ctx).await?;
    info.service_zones
        .into_iter()
        .find(|z| z.service_zone_id == zone_id)
        .map(|z| z.service_zone_location)
        .ok_or_else(|| Error::resolution("service zone", zone_id))
}

/// Product group in a zone, matched on its target product
pub async fn find_product_group(
    ctx: &Context,
    client: &ScpClient,
    zone_id: &str,
    group_name: &str,
    target_product: &str,
) -> Result<ProductGroup> {
    let groups = client
        .product()
        .list_groups(ctx, zone_id, Some(group_name), Some(target_product))
        .await?;
    groups
        .contents
        .into_iter()
        .find(|g| g.target_product == target_product)
        .ok_or_else(|| {
            Error::resolution("product group", format!("{}/{} in {}", group_name, target_product, zone_id))
        })
}

pub async fn resolve_product_group(
    ctx: &Context,
    client: &ScpClient,
    zone_id: &str,
    group_name: &str,
    target_product: &str,
) -> Result<String> {
    let group = find_product_group(ctx, client, zone_id, group_name, target_product).await?;
    Ok(group.product_group_id)
}

fn available<'g>(group: &'g ProductGroup, product_type: &str) -> impl Iterator<Item = &'g Product> {
    group
        .products
        .get(product_type)
        .into_iter()
        .flatten()
        .filter(|p| p.product_state == state::AVAILABLE)
}

/// Product of one type by name; only `AVAILABLE` products are eligible
pub async fn resolve_product(
    ctx: &Context,
    client: &ScpClient,
    group_id: &str,
    product_type: &str,
    product_name: &str,
) -> Result<String> {
    let group = client.product().get_group(ctx, group_id).await?;
    let found = available(&group, product_type)
        .find(|p| p.product_name == product_name)
        .map(|p| p.product_id.clone());
    found.ok_or_else(|| Error::resolution("product", format!("{} {}", product_type, product_name)))
}

/// Scale product with exactly this cpu count and memory size
pub async fn resolve_scale(
    ctx: &Context,
    client: &ScpClient,
    group_id: &str,
    cpu_count: i64,
    memory_gb: i64,
) -> Result<String> {
    let group = client.product().get_group(ctx, group_id).await?;
    let cpu = cpu_count.to_string();
    let memory = memory_gb.to_string();
    let found = group
        .products
        .get(PRODUCT_TYPE_SCALE)
        .into_iter()
        .flatten()
        .find(|p| p.item("cpu") == Some(cpu.as_str()) && p.item("memory") == Some(memory.as_str()))
        .map(|p| p.product_id.clone());
    found.ok_or_else(|| Error::resolution("scale", format!("{} vCPU / {} GB", cpu_count, memory_gb)))
}
