//! Resource Data
//!
//! Per-operation view of one resource instance: the prior state the host
//! recorded, the planned (desired) values, and the state being written back.
//! Adapters translate between this dynamic tree and typed API structs with
//! [`ResourceData::decode`] and [`ResourceData::set_map`], so the per-field
//! dynamic access stays at this one boundary.

use super::Schema;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<Schema>,
    id: String,
    prior: Map<String, Value>,
    planned: Map<String, Value>,
    state: Map<String, Value>,
}

fn object(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

/// Absent, null and empty collections compare equal
pub(crate) fn normalized(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(a)) if a.is_empty() => None,
        Some(Value::Object(o)) if o.is_empty() => None,
        other => other,
    }
}

impl ResourceData {
    /// Build from the host's prior state and planned values (either may be absent)
    pub fn new(schema: Arc<Schema>, prior: Option<&Value>, planned: Option<&Value>) -> Self {
        let prior = object(prior);
        let planned = match planned {
            Some(p) => object(Some(p)),
            None => prior.clone(),
        };
        let id = prior
            .get("id")
            .or_else(|| planned.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            schema,
            id,
            state: planned.clone(),
            prior,
            planned,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Forget the instance; the host drops it from state
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// True until the host has recorded an ID for this instance
    pub fn is_new_resource(&self) -> bool {
        self.prior
            .get("id")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String value, or empty when unset
    pub fn get_string(&self, key: &str) -> String {
        self.get_str(key).unwrap_or_default().to_string()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Value recorded in the prior state
    pub fn prior(&self, key: &str) -> Option<&Value> {
        self.prior.get(key).filter(|v| !v.is_null())
    }

    pub fn has_change(&self, key: &str) -> bool {
        normalized(self.prior.get(key)) != normalized(self.planned.get(key))
    }

    /// `(old, new)` for one field
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (
            normalized(self.prior.get(key)),
            normalized(self.planned.get(key)),
        )
    }

    /// Write one field of the new state; unknown fields are ignored
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if !self.schema.contains_key(key) {
            tracing::warn!("ignoring attribute '{}' not declared in schema", key);
            return;
        }
        self.state.insert(key.to_string(), value.into());
    }

    /// Copy every declared field present in `map` into the new state
    pub fn set_map(&mut self, map: Map<String, Value>) {
        for (key, value) in map {
            if self.schema.contains_key(&key) {
                self.state.insert(key, value);
            }
        }
    }

    /// Decode the current values into a typed input struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut map = self.state.clone();
        map.retain(|_, v| !v.is_null());
        serde_json::from_value(Value::Object(map)).map_err(|e| Error::decode("resource data", e))
    }

    /// Decode one nested field
    pub fn decode_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| Error::decode(key, e)),
            None => Ok(None),
        }
    }

    /// Final state for the host, or `None` once the ID is cleared
    pub fn state(&self) -> Option<Value> {
        if self.id.is_empty() {
            return None;
        }
        let mut out: Map<String, Value> = self
            .state
            .iter()
            .filter(|(k, _)| self.schema.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.insert("id".to_string(), Value::String(self.id.clone()));
        Some(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{schema, Field};
    use serde::Deserialize;
    use serde_json::json;

    fn data(prior: Option<Value>, planned: Option<Value>) -> ResourceData {
        let s = schema([
            ("name", Field::string().required()),
            ("description", Field::string().optional()),
            ("tags", Field::map().optional()),
            ("state", Field::string().computed()),
        ]);
        ResourceData::new(Arc::new(s), prior.as_ref(), planned.as_ref())
    }

    #[test]
    fn test_new_resource_has_no_id() {
        let d = data(None, Some(json!({"name": "a"})));
        assert!(d.is_new_resource());
        assert_eq!(d.id(), "");
        assert!(d.state().is_none());
    }

    #[test]
    fn test_has_change_normalizes_empty() {
        let d = data(
            Some(json!({"id": "x", "name": "a", "tags": {}})),
            Some(json!({"id": "x", "name": "a", "description": null})),
        );
        assert!(!d.has_change("tags"));
        assert!(!d.has_change("description"));
        assert!(!d.has_change("name"));
        assert!(!d.is_new_resource());
    }

    #[test]
    fn test_get_change() {
        let d = data(
            Some(json!({"id": "x", "name": "a", "description": "old"})),
            Some(json!({"id": "x", "name": "a", "description": "new"})),
        );
        assert!(d.has_change("description"));
        let (old, new) = d.get_change("description");
        assert_eq!(old, Some(&json!("old")));
        assert_eq!(new, Some(&json!("new")));
    }

    #[test]
    fn test_set_ignores_undeclared() {
        let mut d = data(None, Some(json!({"name": "a"})));
        d.set_id("vpc-1");
        d.set("state", "ACTIVE");
        d.set("nonsense", 1);
        let state = d.state().unwrap();
        assert_eq!(state["state"], "ACTIVE");
        assert_eq!(state["id"], "vpc-1");
        assert!(state.get("nonsense").is_none());
    }

    #[test]
    fn test_decode_typed_input() {
        #[derive(Deserialize)]
        struct Input {
            name: String,
            #[serde(default)]
            description: Option<String>,
        }
        let d = data(None, Some(json!({"name": "a", "description": null})));
        let input: Input = d.decode().unwrap();
        assert_eq!(input.name, "a");
        assert!(input.description.is_none());
    }

    #[test]
    fn test_clear_id_drops_state() {
        let mut d = data(Some(json!({"id": "x", "name": "a"})), None);
        assert_eq!(d.get_str("name"), Some("a"));
        d.clear_id();
        assert!(d.state().is_none());
    }
}
