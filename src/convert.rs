//! Schema and value conversion
//!
//! Name conversion between the API's camelCase and the schema's snake_case,
//! serialization of typed API responses into schema maps, and derivation of a
//! read-only data-source schema from a resource schema.

use crate::error::{Error, Result};
use crate::schema::{Elem, Field, Schema, Type};
use serde::Serialize;
use serde_json::{Map, Value};

/// Convert a camelCase or PascalCase name to snake_case
///
/// An underscore goes in wherever a lowercase letter or digit is followed by
/// an uppercase letter; the result is lowercased. Runs of capitals stay
/// together (`"ABC"` becomes `"abc"`).
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if let Some(p) = prev {
                if p.is_ascii_lowercase() || p.is_ascii_digit() {
                    out.push('_');
                }
            }
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

fn snake_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (to_snake_case(&k), snake_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_keys).collect()),
        other => other,
    }
}

/// Serialize an API struct into a snake_case keyed map
pub fn to_map<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    let json = serde_json::to_value(value).map_err(|e| Error::decode("api response", e))?;
    match snake_keys(json) {
        Value::Object(map) => Ok(map),
        other => Err(Error::Precondition(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Serialize a list of API structs into snake_case keyed values
pub fn to_list<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| to_map(item).map(Value::Object))
        .collect()
}

fn data_source_field(field: &Field) -> Field {
    let ty = match field.ty() {
        Type::List(elem) | Type::Set(elem) => Type::List(Box::new(match elem.as_ref() {
            Elem::Object(inner) => Elem::Object(as_data_source(inner)),
            Elem::Scalar(t) => Elem::Scalar(t.clone()),
        })),
        other => other.clone(),
    };
    Field {
        ty: Some(ty),
        required: false,
        optional: false,
        computed: true,
        force_new: false,
        immutable: false,
        sensitive: field.sensitive,
        default: None,
        min_items: field.min_items,
        // single-item blocks keep their shape so filter paths can traverse them
        max_items: if field.is_single_block() { 1 } else { 0 },
        validator: None,
        diff_suppress: None,
        description: field.description.clone(),
    }
}

/// Derive the read-only dual of a resource schema
///
/// Every field becomes computed-only; validators, diff suppressors, defaults
/// and item caps are dropped (single-item blocks keep `max_items = 1`); sets
/// become lists; nested blocks recurse.
/// Applying it twice gives the same schema as applying it once.
pub fn as_data_source(schema: &Schema) -> Schema {
    schema
        .iter()
        .map(|(name, field)| (name.clone(), data_source_field(field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{describe, schema};
    use crate::validate;
    use serde::Serialize;
    use serde_json::json;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("ABC"), "abc");
        assert_eq!(to_snake_case("AbCd"), "ab_cd");
        assert_eq!(to_snake_case("A1B"), "a1_b");
        assert_eq!(to_snake_case("vpcId"), "vpc_id");
        assert_eq!(to_snake_case("serviceZoneId"), "service_zone_id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_to_map_recurses_into_lists() {
        #[derive(Serialize)]
        struct Rule {
            #[serde(rename = "ruleId")]
            rule_id: String,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Firewall {
            firewall_id: String,
            #[serde(rename = "Rules")]
            rules: Vec<Rule>,
        }
        let fw = Firewall {
            firewall_id: "fw-1".into(),
            rules: vec![Rule { rule_id: "r-1".into() }],
        };
        let map = to_map(&fw).unwrap();
        assert_eq!(map["firewall_id"], json!("fw-1"));
        assert_eq!(map["rules"][0]["rule_id"], json!("r-1"));
    }

    fn sample() -> Schema {
        schema([
            ("name", Field::string().required().force_new().validate(validate::name_with_dash(3, 20))),
            ("description", Field::string().optional()),
            ("state", Field::string().computed()),
            ("zones", Field::set_of(Type::String).optional().max_items(3)),
            (
                "rules",
                Field::set_block(schema([
                    ("port", Field::string().required()),
                    ("enabled", Field::bool().optional().default_value(true)),
                ]))
                .optional(),
            ),
        ])
    }

    #[test]
    fn test_as_data_source_all_computed() {
        let ds = as_data_source(&sample());
        for field in ds.values() {
            assert!(!field.required && !field.optional && field.computed);
            assert!(field.validator.is_none());
            assert!(field.default.is_none());
            assert_eq!(field.max_items, 0);
        }
        assert!(matches!(ds["zones"].ty(), Type::List(_)));
        let rules = ds["rules"].block().unwrap();
        assert!(rules["port"].computed && !rules["port"].required);
        assert!(rules["enabled"].default.is_none());
    }

    #[test]
    fn test_as_data_source_idempotent() {
        let once = as_data_source(&sample());
        let twice = as_data_source(&once);
        assert_eq!(describe(&once), describe(&twice));
    }
}
