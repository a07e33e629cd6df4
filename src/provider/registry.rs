//! Resource Registry
//!
//! Process-wide catalog of resource and data source types, built once on
//! first use. Registering a managed type also publishes its list data source
//! (`<type>s`) and its singular lookup (`<type>`). Names are unique.

use super::lifecycle::{DataSource, DataSourceEntry, Resource, ResourceEntry};
use crate::data_sources::generic::{ListDataSource, LookupDataSource};
use crate::error::{Error, Result};
use crate::schema::describe;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

#[derive(Default)]
pub struct Registry {
    resources: BTreeMap<&'static str, ResourceEntry>,
    data_sources: BTreeMap<String, DataSourceEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a managed type and its derived data sources
    pub fn add_resource<R: Resource + 'static>(&mut self, resource: R) -> Result<()> {
        let resource: Arc<dyn Resource> = Arc::new(resource);
        let name = resource.type_name();
        if self.resources.contains_key(name) {
            return Err(Error::Config(format!("resource type '{}' registered twice", name)));
        }
        self.resources
            .insert(name, ResourceEntry::new(resource.clone()));
        self.add_data_source(ListDataSource::new(resource.clone()))?;
        self.add_data_source(LookupDataSource::new(resource))?;
        Ok(())
    }

    pub fn add_data_source<D: DataSource + 'static>(&mut self, source: D) -> Result<()> {
        let entry = DataSourceEntry::new(Box::new(source));
        let name = entry.type_name().to_string();
        if self.data_sources.contains_key(&name) {
            return Err(Error::Config(format!("data source '{}' registered twice", name)));
        }
        self.data_sources.insert(name, entry);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceEntry> {
        self.resources.get(name)
    }

    pub fn data_source(&self, name: &str) -> Option<&DataSourceEntry> {
        self.data_sources.get(name)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    /// JSON description of every registered schema
    pub fn describe(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|(name, entry)| (name.to_string(), describe(entry.schema())))
            .collect();
        let data_sources: Map<String, Value> = self
            .data_sources
            .iter()
            .map(|(name, entry)| (name.clone(), describe(entry.schema())))
            .collect();
        json!({
            "resources": resources,
            "data_sources": data_sources,
        })
    }
}

fn build() -> Result<Registry> {
    let mut registry = Registry::new();
    crate::resources::register_all(&mut registry)?;
    crate::data_sources::register_all(&mut registry)?;
    tracing::debug!(
        "registered {} resource types and {} data sources",
        registry.resources.len(),
        registry.data_sources.len()
    );
    Ok(registry)
}

/// The provider's catalog
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| build().unwrap_or_else(|e| panic!("Failed to build registry: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::vpc::Vpc;

    #[test]
    fn test_registry_loads() {
        let registry = registry();
        assert!(registry.resource("scp_vpc").is_some());
        assert!(registry.data_source("scp_vpcs").is_some());
        assert!(registry.data_source("scp_vpc").is_some());
        assert!(registry.data_source("scp_regions").is_some());
        assert!(registry.data_source("scp_firewalls").is_some());
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let mut registry = Registry::new();
        registry.add_resource(Vpc).unwrap();
        let err = registry.add_resource(Vpc).unwrap_err();
        assert!(err.to_string().contains("scp_vpc"));
    }

    #[test]
    fn test_every_resource_has_list_and_lookup() {
        let registry = registry();
        for name in registry.resource_names() {
            assert!(registry.data_source(name).is_some(), "{} lookup", name);
            assert!(
                registry.data_source(&format!("{}s", name)).is_some(),
                "{} list",
                name
            );
        }
    }

    #[test]
    fn test_describe_lists_everything() {
        let desc = registry().describe();
        assert!(desc["resources"]["scp_subnet"]["cidr_block"].is_object());
        assert_eq!(desc["data_sources"]["scp_vpcs"]["contents"]["type"], "list");
    }
}
