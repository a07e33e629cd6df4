//! Property-based tests using proptest
//!
//! Filters, name conversion and tag diffs are pure functions with algebraic
//! properties; these check them over randomized inputs.

use proptest::prelude::*;
use scp_provider::convert::to_snake_case;
use scp_provider::filter::{self, Filter};
use scp_provider::schema::{schema, Field, Schema};
use scp_provider::tags;
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn item_schema() -> Schema {
    schema([
        ("id", Field::string().computed()),
        ("name", Field::string().computed()),
        ("state", Field::string().computed()),
        ("size", Field::int().computed()),
    ])
}

/// Generate one listed item
fn arb_item() -> impl Strategy<Value = Value> {
    (
        "[A-Z]{3}-[0-9]{1,4}",
        "[a-z][a-z0-9-]{2,20}",
        prop_oneof!["ACTIVE", "CREATING", "DELETING", "ERROR"],
        0i64..2048,
    )
        .prop_map(|(id, name, state, size)| {
            json!({"id": id, "name": name, "state": state, "size": size})
        })
}

fn arb_items() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_item(), 0..60)
}

fn arb_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![
        prop::collection::vec(prop_oneof!["ACTIVE", "CREATING", "ERROR"], 1..3)
            .prop_map(|v| Filter::new("state", v.into_iter().map(String::from).collect())),
        (0i64..2048).prop_map(|n| Filter::new("size", vec![n.to_string()])),
        "[a-z]{1,3}".prop_map(|p| Filter::regex("name", vec![format!("^{}", p)])),
    ]
}

fn arb_tags() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..8)
}

proptest! {
    #[test]
    fn test_empty_filters_are_identity(items in arb_items()) {
        let out = filter::apply(items.clone(), &[], &item_schema()).unwrap();
        prop_assert_eq!(out, items);
    }

    #[test]
    fn test_filtering_is_idempotent(items in arb_items(), filters in prop::collection::vec(arb_filter(), 1..3)) {
        let s = item_schema();
        let once = filter::apply(items, &filters, &s).unwrap();
        let twice = filter::apply(once.clone(), &filters, &s).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_filtering_keeps_order_and_subset(items in arb_items(), f in arb_filter()) {
        let out = filter::apply(items.clone(), &[f], &item_schema()).unwrap();
        prop_assert!(out.len() <= items.len());
        let mut rest = items.iter();
        for kept in &out {
            prop_assert!(rest.any(|i| i == kept), "filtered item out of order");
        }
    }

    #[test]
    fn test_state_filter_matches_exactly(items in arb_items()) {
        let f = Filter::new("state", vec!["ACTIVE".to_string()]);
        let out = filter::apply(items.clone(), &[f], &item_schema()).unwrap();
        let expected = items.iter().filter(|i| i["state"] == "ACTIVE").count();
        prop_assert_eq!(out.len(), expected);
    }

    #[test]
    fn test_snake_case_is_idempotent(name in "[A-Za-z][A-Za-z0-9]{0,30}") {
        let once = to_snake_case(&name);
        prop_assert_eq!(to_snake_case(&once), once.clone());
        prop_assert!(!once.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_snake_case_of_camel_words(words in prop::collection::vec("[a-z]{1,8}", 1..5)) {
        let camel: String = words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                if i == 0 {
                    w.clone()
                } else {
                    let mut c = w.chars();
                    c.next().map(|f| f.to_ascii_uppercase().to_string() + c.as_str()).unwrap_or_default()
                }
            })
            .collect();
        prop_assert_eq!(to_snake_case(&camel), words.join("_"));
    }

    #[test]
    fn test_tag_diff_of_equal_sets_is_empty(t in arb_tags()) {
        prop_assert!(tags::diff(&t, &t).is_empty());
    }

    #[test]
    fn test_tag_diff_reaches_desired(prior in arb_tags(), desired in arb_tags()) {
        let d = tags::diff(&prior, &desired);
        let mut result = prior.clone();
        for t in &d.remove {
            result.remove(&t.tag_key);
        }
        for t in &d.add {
            result.insert(t.tag_key.clone(), t.tag_value.clone());
        }
        prop_assert_eq!(result, desired);
    }

    #[test]
    fn test_tag_diff_never_touches_unchanged_pairs(prior in arb_tags(), desired in arb_tags()) {
        let d = tags::diff(&prior, &desired);
        for t in d.remove.iter().chain(d.add.iter()) {
            let unchanged = prior.get(&t.tag_key) == desired.get(&t.tag_key);
            prop_assert!(!unchanged, "unchanged key {} in diff", t.tag_key);
        }
    }
}
