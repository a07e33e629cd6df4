//! Managed resource types
//!
//! One adapter per cloud object. Each declares its schema and talks to its
//! service client; validation, planning, tag reconciliation and the
//! read-after-write cycle come from the shared driver in
//! [`crate::provider::lifecycle`].

pub mod block_storage;
pub mod file_storage;
pub mod firewall_rule;
pub mod iam_role;
pub mod internet_gateway;
pub mod kubernetes_engine;
pub mod kubernetes_node_pool;
pub mod load_balancer_profile;
pub mod nat_gateway;
pub mod public_ip;
pub mod subnet;
pub mod vpc;
pub mod vpc_dc;

use crate::context::Context;
use crate::error::{GonePolicy, Result};
use crate::poll::{gone_as_deleted, Waiter};
use crate::provider::Registry;
use serde_json::{Map, Value};
use std::future::Future;

pub fn register_all(registry: &mut Registry) -> Result<()> {
    registry.add_resource(vpc::Vpc)?;
    registry.add_resource(vpc_dc::VpcDc)?;
    registry.add_resource(subnet::Subnet)?;
    registry.add_resource(public_ip::PublicIp)?;
    registry.add_resource(internet_gateway::InternetGateway)?;
    registry.add_resource(nat_gateway::NatGateway)?;
    registry.add_resource(firewall_rule::FirewallRule)?;
    registry.add_resource(block_storage::BlockStorage)?;
    registry.add_resource(file_storage::FileStorage)?;
    registry.add_resource(kubernetes_engine::KubernetesEngine)?;
    registry.add_resource(kubernetes_node_pool::KubernetesNodePool)?;
    registry.add_resource(load_balancer_profile::LoadBalancerProfile)?;
    registry.add_resource(iam_role::IamRole)?;
    Ok(())
}

/// Object of a `json!` literal
pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Wait for `refresh` to report a target state
///
/// When `target` is the deleted state, a deleted-equivalent response under
/// `policy` counts as reaching it; otherwise such a response fails the wait.
pub(crate) async fn converge<T, F, Fut>(
    ctx: &Context,
    waiter: Waiter,
    policy: GonePolicy,
    refresh: F,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(T, String)>>,
{
    let deleting = waiter
        .target
        .iter()
        .any(|t| t == crate::poll::state::DELETED);
    waiter
        .wait(ctx, || gone_as_deleted(refresh(), policy, !deleting))
        .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for adapter unit tests

    use crate::provider::lifecycle::{Resource, ResourceEntry};
    use crate::schema::{Diagnostics, ResourceData};
    use serde_json::Value;
    use std::sync::Arc;

    /// Schema plus cross-field diagnostics of one configuration
    pub fn validate<R: Resource + 'static>(resource: R, config: Value) -> Diagnostics {
        ResourceEntry::new(Arc::new(resource)).validate(&config)
    }

    pub fn data<R: Resource>(resource: &R, prior: Option<Value>, planned: Option<Value>) -> ResourceData {
        ResourceData::new(Arc::new(resource.schema()), prior.as_ref(), planned.as_ref())
    }
}
