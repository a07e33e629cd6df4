//! Data sources
//!
//! Standalone read-only types. List and lookup data sources for managed
//! resource types are derived in [`generic`] and registered alongside each
//! resource.

pub mod firewalls;
pub mod generic;
pub mod product_group;
pub mod region;

use crate::error::Result;
use crate::provider::Registry;

pub fn register_all(registry: &mut Registry) -> Result<()> {
    registry.add_data_source(region::Region)?;
    registry.add_data_source(region::Regions)?;
    registry.add_data_source(product_group::ProductGroupSource)?;
    registry.add_data_source(firewalls::Firewalls)?;
    Ok(())
}
