//! Resource schemas
//!
//! A schema maps field names to [`Field`] specs. The host diffs and reconciles
//! values against these declarations; the lifecycle driver uses the same
//! metadata (`force_new`, `immutable`, validators, defaults) so individual
//! adapters only implement the API calls.
//!
//! # Module Structure
//!
//! - [`data`] - Per-operation view of one resource instance
//! - [`diag`] - Diagnostics and attribute paths

pub mod data;
pub mod diag;

pub use data::ResourceData;
pub use diag::{AttributePath, Diagnostic, Diagnostics, Severity};

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field-level value check
pub type Validator = Arc<dyn Fn(&Value, &AttributePath) -> Diagnostics + Send + Sync>;

/// Returns true when the difference between old and new should be ignored
pub type DiffSuppressFn = fn(key: &str, old: &Value, new: &Value) -> bool;

pub type Schema = BTreeMap<String, Field>;

/// Build a schema from `(name, field)` pairs
pub fn schema<I>(fields: I) -> Schema
where
    I: IntoIterator<Item = (&'static str, Field)>,
{
    fields
        .into_iter()
        .map(|(name, field)| (name.to_string(), field))
        .collect()
}

/// Semantic type of a field
#[derive(Debug, Clone)]
pub enum Type {
    String,
    Int,
    Float,
    Bool,
    /// Map of string to any scalar
    Map,
    List(Box<Elem>),
    Set(Box<Elem>),
}

/// Element of a list or set
#[derive(Debug, Clone)]
pub enum Elem {
    Scalar(Type),
    Object(Schema),
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Type::String => "string",
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Map => "map",
            Type::List(_) => "list",
            Type::Set(_) => "set",
        }
    }

    pub fn elem(&self) -> Option<&Elem> {
        match self {
            Type::List(e) | Type::Set(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct Field {
    pub ty: Option<Type>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// A change forces destroy-create
    pub force_new: bool,
    /// A change after creation is rejected at plan time
    pub immutable: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub min_items: usize,
    /// 0 means unlimited
    pub max_items: usize,
    pub validator: Option<Validator>,
    pub diff_suppress: Option<DiffSuppressFn>,
    pub description: String,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("ty", &self.ty)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("force_new", &self.force_new)
            .field("immutable", &self.immutable)
            .field("min_items", &self.min_items)
            .field("max_items", &self.max_items)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl Field {
    fn of(ty: Type) -> Self {
        Self {
            ty: Some(ty),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of(Type::String)
    }

    pub fn int() -> Self {
        Self::of(Type::Int)
    }

    pub fn float() -> Self {
        Self::of(Type::Float)
    }

    pub fn bool() -> Self {
        Self::of(Type::Bool)
    }

    pub fn map() -> Self {
        Self::of(Type::Map)
    }

    pub fn list_of(ty: Type) -> Self {
        Self::of(Type::List(Box::new(Elem::Scalar(ty))))
    }

    pub fn set_of(ty: Type) -> Self {
        Self::of(Type::Set(Box::new(Elem::Scalar(ty))))
    }

    pub fn list_block(inner: Schema) -> Self {
        Self::of(Type::List(Box::new(Elem::Object(inner))))
    }

    pub fn set_block(inner: Schema) -> Self {
        Self::of(Type::Set(Box::new(Elem::Object(inner))))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = n;
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = n;
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn suppress(mut self, f: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(f);
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn ty(&self) -> &Type {
        self.ty.as_ref().unwrap_or(&Type::String)
    }

    /// Optional without being computed: the cloud never fills it in
    pub fn is_pure_optional(&self) -> bool {
        self.optional && !self.computed && !self.required
    }

    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Nested object schema for single-item blocks and block lists
    pub fn block(&self) -> Option<&Schema> {
        match self.ty().elem() {
            Some(Elem::Object(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_single_block(&self) -> bool {
        self.block().is_some() && self.min_items == 1 && self.max_items == 1
    }
}

/// Suppress differences in letter case
pub fn suppress_case(_key: &str, old: &Value, new: &Value) -> bool {
    match (old.as_str(), new.as_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Render a schema as a JSON description for the host catalog
pub fn describe(schema: &Schema) -> Value {
    let mut out = Map::new();
    for (name, field) in schema {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(field.ty().name()));
        obj.insert("required".into(), json!(field.required));
        obj.insert("optional".into(), json!(field.optional));
        obj.insert("computed".into(), json!(field.computed));
        if field.force_new {
            obj.insert("force_new".into(), Value::Bool(true));
        }
        if field.immutable {
            obj.insert("immutable".into(), Value::Bool(true));
        }
        if field.sensitive {
            obj.insert("sensitive".into(), Value::Bool(true));
        }
        if let Some(default) = &field.default {
            obj.insert("default".into(), default.clone());
        }
        if field.min_items > 0 {
            obj.insert("min_items".into(), json!(field.min_items));
        }
        if field.max_items > 0 {
            obj.insert("max_items".into(), json!(field.max_items));
        }
        if !field.description.is_empty() {
            obj.insert("description".into(), json!(field.description));
        }
        match field.ty().elem() {
            Some(Elem::Object(inner)) => {
                obj.insert("elem".into(), describe(inner));
            }
            Some(Elem::Scalar(t)) => {
                obj.insert("elem".into(), json!(t.name()));
            }
            None => {}
        }
        out.insert(name.clone(), Value::Object(obj));
    }
    Value::Object(out)
}

/// Fill in declared defaults for absent fields
pub fn apply_defaults(schema: &Schema, obj: &mut Map<String, Value>) {
    for (name, field) in schema {
        let absent = obj.get(name).map_or(true, Value::is_null);
        if absent {
            if let Some(default) = &field.default {
                obj.insert(name.clone(), default.clone());
            }
        }
        if let (Some(inner), Some(Value::Array(items))) = (field.block(), obj.get_mut(name)) {
            for item in items.iter_mut() {
                if let Value::Object(m) = item {
                    apply_defaults(inner, m);
                }
            }
        }
    }
}

fn type_matches(ty: &Type, value: &Value) -> bool {
    match ty {
        Type::String => value.is_string(),
        Type::Int => value.is_i64() || value.is_u64(),
        Type::Float => value.is_number(),
        Type::Bool => value.is_boolean(),
        Type::Map => value.is_object(),
        Type::List(_) | Type::Set(_) => value.is_array(),
    }
}

/// Check a user-supplied object against a schema
///
/// Reports missing required fields, unknown fields, computed-only fields set
/// by the user, type mismatches, item-count bounds and field validators.
pub fn validate_object(schema: &Schema, obj: &Map<String, Value>, path: &AttributePath) -> Diagnostics {
    let mut diags = Diagnostics::new();

    for key in obj.keys() {
        if key == "id" {
            continue;
        }
        if !schema.contains_key(key) {
            diags.error(&path.key(key), "unsupported argument");
        }
    }

    for (name, field) in schema {
        let fpath = path.key(name);
        let value = obj.get(name).filter(|v| !v.is_null());

        let Some(value) = value else {
            if field.required {
                diags.error(&fpath, "required argument is missing");
            }
            continue;
        };

        if field.is_computed_only() {
            diags.error(&fpath, "value is computed by the cloud and cannot be set");
            continue;
        }

        if !type_matches(field.ty(), value) {
            diags.error(&fpath, format!("expected {}", field.ty().name()));
            continue;
        }

        if let Value::Array(items) = value {
            if items.len() < field.min_items {
                diags.error(&fpath, format!("at least {} item(s) required", field.min_items));
            }
            if field.max_items > 0 && items.len() > field.max_items {
                diags.error(&fpath, format!("at most {} item(s) allowed", field.max_items));
            }
            match field.ty().elem() {
                Some(Elem::Object(inner)) => {
                    for (i, item) in items.iter().enumerate() {
                        match item.as_object() {
                            Some(m) => diags.extend(validate_object(inner, m, &fpath.index(i))),
                            None => diags.error(&fpath.index(i), "expected object"),
                        }
                    }
                }
                Some(Elem::Scalar(t)) => {
                    for (i, item) in items.iter().enumerate() {
                        if !type_matches(t, item) {
                            diags.error(&fpath.index(i), format!("expected {}", t.name()));
                        }
                    }
                }
                None => {}
            }
        }

        if let Some(validator) = &field.validator {
            diags.extend(validator(value, &fpath));
        }
    }

    diags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        schema([
            ("name", Field::string().required().force_new()),
            ("description", Field::string().optional()),
            ("state", Field::string().computed()),
            ("enabled", Field::bool().optional().default_value(true)),
            (
                "schedule",
                Field::list_block(schema([
                    ("hour", Field::int().required()),
                    ("day", Field::string().optional().default_value("MON")),
                ]))
                .optional()
                .max_items(1),
            ),
        ])
    }

    #[test]
    fn test_validate_object_reports_problems() {
        let obj = json!({
            "description": 5,
            "state": "ACTIVE",
            "bogus": "x",
        });
        let diags = validate_object(&sample(), obj.as_object().unwrap(), &AttributePath::root());
        let text = diags.to_string();
        assert!(text.contains("bogus: unsupported argument"));
        assert!(text.contains("name: required argument is missing"));
        assert!(text.contains("description: expected string"));
        assert!(text.contains("state: value is computed"));
    }

    #[test]
    fn test_validate_nested_block() {
        let obj = json!({
            "name": "a",
            "schedule": [{"day": "TUE"}, {"hour": 1}],
        });
        let diags = validate_object(&sample(), obj.as_object().unwrap(), &AttributePath::root());
        let text = diags.to_string();
        assert!(text.contains("schedule: at most 1 item(s) allowed"));
        assert!(text.contains("schedule.0.hour: required argument is missing"));
    }

    #[test]
    fn test_apply_defaults_recurses() {
        let mut obj = json!({"name": "a", "schedule": [{"hour": 3}]})
            .as_object()
            .cloned()
            .unwrap();
        apply_defaults(&sample(), &mut obj);
        assert_eq!(obj["enabled"], json!(true));
        assert_eq!(obj["schedule"][0]["day"], json!("MON"));
    }

    #[test]
    fn test_describe() {
        let desc = describe(&sample());
        assert_eq!(desc["name"]["type"], "string");
        assert_eq!(desc["name"]["force_new"], true);
        assert_eq!(desc["schedule"]["elem"]["hour"]["required"], true);
        assert_eq!(desc["schedule"]["max_items"], 1);
    }
}
