//! Data source filters
//!
//! Evaluates user-supplied `filter` blocks against decoded list items. A filter
//! names a dotted attribute path, resolved against the schema of the listed
//! items, and a set of candidate values. An item passes when, for every
//! filter, at least one candidate matches the value found at that path.

use crate::error::{Error, Result};
use crate::schema::{schema, AttributePath, Diagnostics, Elem, Field, Schema, Type};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `filter` block from a data source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub use_regex: bool,
}

impl Filter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
            use_regex: false,
        }
    }

    pub fn regex(name: &str, values: Vec<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::new(name, values)
        }
    }
}

/// Schema declaration of the repeated `filter` block
pub fn filter_field() -> Field {
    Field::set_block(schema([
        ("name", Field::string().required()),
        ("values", Field::list_of(Type::String).required().min_items(1)),
        ("use_regex", Field::bool().optional().default_value(false)),
    ]))
    .optional()
    .describe("Client-side filters: every block must match, any value within a block may match")
}

fn rejected(name: &str, segment: &str) -> Error {
    let mut diags = Diagnostics::new();
    diags.error(
        &AttributePath::from("filter"),
        format!(
            "cannot filter on '{}': '{}' is a list that is neither strings nor a single nested block",
            name, segment
        ),
    );
    Error::Validation(diags)
}

/// Resolve a dotted filter name into the key path used to walk items
///
/// A name that does not resolve against the schema is kept whole and compared
/// against a top-level key of that name.
pub fn resolve_path(name: &str, schema: &Schema) -> Result<Vec<String>> {
    let parts: Vec<&str> = name.split('.').collect();
    let mut segments = Vec::new();
    let mut current = Some(schema);

    for (i, part) in parts.iter().enumerate() {
        let Some(node) = current else {
            return Ok(vec![name.to_string()]);
        };
        let Some(field) = node.get(*part) else {
            return Ok(vec![name.to_string()]);
        };
        segments.push(part.to_string());

        match field.ty() {
            Type::Map => {
                let rest = parts[i + 1..].join(".");
                if !rest.is_empty() {
                    segments.push(rest);
                }
                return Ok(segments);
            }
            Type::List(elem) | Type::Set(elem) => match elem.as_ref() {
                Elem::Object(inner) if field.is_single_block() => current = Some(inner),
                Elem::Scalar(Type::String) => current = None,
                _ => return Err(rejected(name, part)),
            },
            _ => current = None,
        }
    }

    Ok(segments)
}

/// Unwrap a single-element list holding an object, the host's encoding of a
/// nested block
fn unwrap_single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 && items[0].is_object() => &items[0],
        other => other,
    }
}

/// Follow a resolved key path through an item
pub fn walk<'a>(item: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = item;
    for segment in path {
        current = unwrap_single(current).as_object()?.get(segment)?;
    }
    Some(current)
}

struct Compiled {
    path: Vec<String>,
    values: Vec<String>,
    regexes: Option<Vec<Regex>>,
}

impl Compiled {
    fn new(filter: &Filter, schema: &Schema) -> Result<Self> {
        let path = resolve_path(&filter.name, schema)?;
        let regexes = filter.use_regex.then(|| {
            filter
                .values
                .iter()
                .filter_map(|v| match Regex::new(v) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!("ignoring invalid filter regex '{}': {}", v, e);
                        None
                    }
                })
                .collect()
        });
        Ok(Self {
            path,
            values: filter.values.clone(),
            regexes,
        })
    }

    fn string_matches(&self, s: &str) -> bool {
        match &self.regexes {
            Some(res) => res.iter().any(|re| re.is_match(s)),
            None => self.values.iter().any(|v| v == s),
        }
    }

    fn matches(&self, item: &Value) -> bool {
        match walk(item, &self.path) {
            Some(value) => self.value_matches(value),
            None => false,
        }
    }

    fn value_matches(&self, value: &Value) -> bool {
        match value {
            Value::Bool(b) => self.values.iter().any(|c| match c.parse::<bool>() {
                Ok(v) => v == *b,
                Err(_) => {
                    tracing::warn!("filter value '{}' is not a bool", c);
                    false
                }
            }),
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                self.values.iter().any(|c| match c.parse::<i64>() {
                    Ok(v) => n.as_i64() == Some(v),
                    Err(_) => {
                        tracing::warn!("filter value '{}' is not an integer", c);
                        false
                    }
                })
            }
            Value::Number(n) => self.values.iter().any(|c| match c.parse::<f64>() {
                Ok(v) => n.as_f64() == Some(v),
                Err(_) => {
                    tracing::warn!("filter value '{}' is not a number", c);
                    false
                }
            }),
            Value::String(s) => self.string_matches(s),
            Value::Array(items) => items
                .iter()
                .any(|it| it.as_str().is_some_and(|s| self.string_matches(s))),
            _ => false,
        }
    }
}

/// Keep the items that match every filter
pub fn apply(items: Vec<Value>, filters: &[Filter], schema: &Schema) -> Result<Vec<Value>> {
    if filters.is_empty() {
        return Ok(items);
    }
    let compiled = filters
        .iter()
        .map(|f| Compiled::new(f, schema))
        .collect::<Result<Vec<_>>>()?;

    Ok(items
        .into_iter()
        .filter(|item| compiled.iter().all(|c| c.matches(item)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contents_schema() -> Schema {
        schema([
            ("name", Field::string().computed()),
            ("zone", Field::string().computed()),
            ("size", Field::int().computed()),
            ("ratio", Field::float().computed()),
            ("enabled", Field::bool().computed()),
            ("cidrs", Field::list_of(Type::String).computed()),
            ("labels", Field::map().computed()),
            (
                "network",
                Field::list_block(schema([("vpc_id", Field::string().computed())]))
                    .computed()
                    .min_items(1)
                    .max_items(1),
            ),
            (
                "rules",
                Field::list_block(schema([("port", Field::string().computed())])).computed(),
            ),
        ])
    }

    fn items() -> Vec<Value> {
        vec![
            json!({"name": "a", "zone": "z1", "size": 10, "ratio": 0.5, "enabled": true,
                   "cidrs": ["10.0.0.0/24"], "labels": {"env.tier": "prod"},
                   "network": [{"vpc_id": "vpc-1"}]}),
            json!({"name": "b", "zone": "z2", "size": 20, "ratio": 1.5, "enabled": false,
                   "cidrs": ["10.1.0.0/24", "10.2.0.0/24"], "labels": {"env.tier": "dev"},
                   "network": [{"vpc_id": "vpc-2"}]}),
            json!({"name": "c", "zone": "z1", "size": 30, "ratio": 2.5, "enabled": true,
                   "cidrs": [], "labels": {},
                   "network": [{"vpc_id": "vpc-1"}]}),
        ]
    }

    fn names(items: &[Value]) -> Vec<&str> {
        items.iter().filter_map(|i| i["name"].as_str()).collect()
    }

    #[test]
    fn test_filter_by_zone() {
        let out = apply(items(), &[Filter::new("zone", vec!["z1".into()])], &contents_schema()).unwrap();
        assert_eq!(names(&out), vec!["a", "c"]);
    }

    #[test]
    fn test_or_within_and_across() {
        let filters = [
            Filter::new("name", vec!["a".into(), "b".into()]),
            Filter::new("zone", vec!["z1".into()]),
        ];
        let out = apply(items(), &filters, &contents_schema()).unwrap();
        assert_eq!(names(&out), vec!["a"]);
    }

    #[test]
    fn test_typed_comparisons() {
        let s = contents_schema();
        let out = apply(items(), &[Filter::new("size", vec!["20".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["b"]);
        let out = apply(items(), &[Filter::new("ratio", vec!["2.5".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["c"]);
        let out = apply(items(), &[Filter::new("enabled", vec!["false".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["b"]);
    }

    #[test]
    fn test_parse_failure_is_non_match() {
        let out = apply(
            items(),
            &[Filter::new("size", vec!["ten".into(), "10".into()])],
            &contents_schema(),
        )
        .unwrap();
        assert_eq!(names(&out), vec!["a"]);
    }

    #[test]
    fn test_string_slice_any_element() {
        let out = apply(
            items(),
            &[Filter::new("cidrs", vec!["10.2.0.0/24".into()])],
            &contents_schema(),
        )
        .unwrap();
        assert_eq!(names(&out), vec!["b"]);
    }

    #[test]
    fn test_regex() {
        let out = apply(
            items(),
            &[Filter::regex("name", vec!["^[ab]$".into()])],
            &contents_schema(),
        )
        .unwrap();
        assert_eq!(names(&out), vec!["a", "b"]);
    }

    #[test]
    fn test_single_block_is_unwrapped() {
        let s = contents_schema();
        assert_eq!(resolve_path("network.vpc_id", &s).unwrap(), vec!["network", "vpc_id"]);
        let out = apply(items(), &[Filter::new("network.vpc_id", vec!["vpc-1".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["a", "c"]);
    }

    #[test]
    fn test_map_consumes_remainder() {
        let s = contents_schema();
        assert_eq!(resolve_path("labels.env.tier", &s).unwrap(), vec!["labels", "env.tier"]);
        let out = apply(items(), &[Filter::new("labels.env.tier", vec!["dev".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["b"]);
    }

    #[test]
    fn test_list_of_blocks_rejected() {
        let err = resolve_path("rules.port", &contents_schema()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_path_degenerates_to_top_level() {
        let s = contents_schema();
        assert_eq!(resolve_path("no.such.path", &s).unwrap(), vec!["no.such.path"]);
        let items = vec![json!({"name": "x", "no.such.path": "v"}), json!({"name": "y"})];
        let out = apply(items, &[Filter::new("no.such.path", vec!["v".into()])], &s).unwrap();
        assert_eq!(names(&out), vec!["x"]);
    }

    #[test]
    fn test_empty_filters_identity() {
        let out = apply(items(), &[], &contents_schema()).unwrap();
        assert_eq!(out, items());
    }

    #[test]
    fn test_filter_deserializes_default_regex() {
        let f: Filter = serde_json::from_value(json!({"name": "zone", "values": ["z1"]})).unwrap();
        assert!(!f.use_regex);
    }
}
