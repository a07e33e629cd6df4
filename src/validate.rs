//! Field validators
//!
//! Reusable value checks composed into schema field declarations. Each
//! constructor returns a [`Validator`] that reports problems as diagnostics
//! annotated with the attribute path it was called with.

use crate::schema::{AttributePath, Diagnostics, Validator};
use ipnet::Ipv4Net;
use regex::Regex;
use serde_json::Value;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Maximum length of description fields across services
pub const DESCRIPTION_MAX_LEN: usize = 50;

fn with_str<F>(check: F) -> Validator
where
    F: Fn(&str, &AttributePath, &mut Diagnostics) + Send + Sync + 'static,
{
    Arc::new(move |value: &Value, path: &AttributePath| {
        let mut diags = Diagnostics::new();
        match value.as_str() {
            Some(s) => check(s, path, &mut diags),
            None => diags.error(path, "expected a string"),
        }
        diags
    })
}

fn with_int<F>(check: F) -> Validator
where
    F: Fn(i64, &AttributePath, &mut Diagnostics) + Send + Sync + 'static,
{
    Arc::new(move |value: &Value, path: &AttributePath| {
        let mut diags = Diagnostics::new();
        match value.as_i64() {
            Some(n) => check(n, path, &mut diags),
            None => diags.error(path, "expected an integer"),
        }
        diags
    })
}

pub fn string_len_between(min: usize, max: usize) -> Validator {
    with_str(move |s, path, diags| {
        let len = s.chars().count();
        if len < min || len > max {
            diags.error(
                path,
                format!("must be between {} and {} characters, got {}", min, max, len),
            );
        }
    })
}

/// Free-text description limited to [`DESCRIPTION_MAX_LEN`] characters
pub fn description() -> Validator {
    string_len_between(0, DESCRIPTION_MAX_LEN)
}

pub fn string_in(allowed: &'static [&'static str]) -> Validator {
    with_str(move |s, path, diags| {
        if !allowed.contains(&s) {
            diags.error(
                path,
                format!("expected one of [{}], got '{}'", allowed.join(", "), s),
            );
        }
    })
}

/// Human-visible resource name: starts with a letter, then letters, digits
/// and dashes, never ending in a dash
pub fn name_with_dash(min: usize, max: usize) -> Validator {
    with_str(move |s, path, diags| {
        let len = s.chars().count();
        if len < min || len > max {
            diags.error(
                path,
                format!("must be between {} and {} characters, got {}", min, max, len),
            );
            return;
        }
        let starts_with_letter = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        let allowed = s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !starts_with_letter || !allowed || s.ends_with('-') {
            diags.error(
                path,
                "must start with a letter and contain only letters, digits and '-' (not at the end)",
            );
        }
    })
}

/// Name made of letters and digits only, starting with a letter
pub fn alphanumeric_name(min: usize, max: usize) -> Validator {
    with_str(move |s, path, diags| {
        let len = s.chars().count();
        let starts_with_letter = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if len < min || len > max || !starts_with_letter || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            diags.error(
                path,
                format!(
                    "must be {}-{} letters or digits starting with a letter",
                    min, max
                ),
            );
        }
    })
}

pub fn regex_match(pattern: &str, message: &'static str) -> Validator {
    match Regex::new(pattern) {
        Ok(re) => with_str(move |s, path, diags| {
            if !re.is_match(s) {
                diags.error(path, message);
            }
        }),
        Err(e) => {
            let msg = format!("invalid validation pattern: {}", e);
            Arc::new(move |_: &Value, path: &AttributePath| {
                let mut diags = Diagnostics::new();
                diags.error(path, msg.clone());
                diags
            })
        }
    }
}

pub fn cidr() -> Validator {
    cidr_prefix_between(0, 32)
}

/// IPv4 CIDR whose prefix length lies within `[min, max]`
pub fn cidr_prefix_between(min: u8, max: u8) -> Validator {
    with_str(move |s, path, diags| match s.parse::<Ipv4Net>() {
        Ok(net) => {
            if net.prefix_len() < min || net.prefix_len() > max {
                diags.error(
                    path,
                    format!("prefix length must be between /{} and /{}", min, max),
                );
            } else if net.network() != net.addr() {
                diags.error(
                    path,
                    format!("'{}' is not a network address, use {}", s, net.trunc()),
                );
            }
        }
        Err(_) => diags.error(path, format!("'{}' is not a valid IPv4 CIDR", s)),
    })
}

/// Single IPv4 address or IPv4 CIDR
pub fn ip_or_cidr() -> Validator {
    with_str(|s, path, diags| {
        if s.parse::<Ipv4Addr>().is_err() && s.parse::<Ipv4Net>().is_err() {
            diags.error(path, format!("'{}' is not an IPv4 address or CIDR", s));
        }
    })
}

/// `ALL`, a single port, or a `low-high` range
pub fn port_spec() -> Validator {
    fn port(s: &str) -> Option<u16> {
        s.parse::<u16>().ok().filter(|p| *p > 0)
    }
    with_str(|s, path, diags| {
        if s == "ALL" {
            return;
        }
        let ok = match s.split_once('-') {
            Some((lo, hi)) => matches!((port(lo), port(hi)), (Some(a), Some(b)) if a <= b),
            None => port(s).is_some(),
        };
        if !ok {
            diags.error(path, format!("'{}' is not a port, port range or ALL", s));
        }
    })
}

pub fn int_between(min: i64, max: i64) -> Validator {
    with_int(move |n, path, diags| {
        if n < min || n > max {
            diags.error(path, format!("must be between {} and {}, got {}", min, max, n));
        }
    })
}

/// Integer within `[min, max]` that is also a multiple of `step`
pub fn int_between_step(min: i64, max: i64, step: i64) -> Validator {
    with_int(move |n, path, diags| {
        if n < min || n > max {
            diags.error(path, format!("must be between {} and {}, got {}", min, max, n));
        } else if step > 0 && n % step != 0 {
            diags.error(path, format!("must be a multiple of {}, got {}", step, n));
        }
    })
}

/// Apply a validator to every element of a list value
pub fn each(inner: Validator) -> Validator {
    Arc::new(move |value: &Value, path: &AttributePath| {
        let mut diags = Diagnostics::new();
        if let Some(items) = value.as_array() {
            for (i, item) in items.iter().enumerate() {
                diags.extend(inner(item, &path.index(i)));
            }
        }
        diags
    })
}

/// Run every validator and collect all diagnostics
pub fn all(validators: Vec<Validator>) -> Validator {
    Arc::new(move |value: &Value, path: &AttributePath| {
        let mut diags = Diagnostics::new();
        for v in &validators {
            diags.extend(v(value, path));
        }
        diags
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(v: &Validator, value: Value) -> usize {
        v(&value, &AttributePath::from("field")).len()
    }

    #[test]
    fn test_name_with_dash() {
        let v = name_with_dash(3, 28);
        assert_eq!(errors(&v, json!("vpc-main")), 0);
        assert_eq!(errors(&v, json!("ab")), 1);
        assert_eq!(errors(&v, json!("1vpc")), 1);
        assert_eq!(errors(&v, json!("vpc-")), 1);
        assert_eq!(errors(&v, json!("vpc_main")), 1);
        assert_eq!(errors(&v, json!("a".repeat(29))), 1);
    }

    #[test]
    fn test_string_in() {
        let v = string_in(&["INTERNET", "DEDICATED_INTERNET", "SHARED_GROUP", "SECURE_INTERNET"]);
        assert_eq!(errors(&v, json!("INTERNET")), 0);
        assert_eq!(errors(&v, json!("internet")), 1);
        assert_eq!(errors(&v, json!(3)), 1);
    }

    #[test]
    fn test_cidr() {
        let v = cidr_prefix_between(16, 28);
        assert_eq!(errors(&v, json!("192.168.0.0/24")), 0);
        assert_eq!(errors(&v, json!("192.168.0.0/8")), 1);
        assert_eq!(errors(&v, json!("192.168.0.1/24")), 1);
        assert_eq!(errors(&v, json!("not-a-cidr")), 1);
    }

    #[test]
    fn test_int_between_step() {
        let v = int_between_step(100, 500, 50);
        assert_eq!(errors(&v, json!(100)), 0);
        assert_eq!(errors(&v, json!(450)), 0);
        assert_eq!(errors(&v, json!(125)), 1);
        assert_eq!(errors(&v, json!(550)), 1);
        assert_eq!(errors(&v, json!("100")), 1);
    }

    #[test]
    fn test_port_spec() {
        let v = port_spec();
        assert_eq!(errors(&v, json!("ALL")), 0);
        assert_eq!(errors(&v, json!("443")), 0);
        assert_eq!(errors(&v, json!("8000-8080")), 0);
        assert_eq!(errors(&v, json!("9000-80")), 1);
        assert_eq!(errors(&v, json!("0")), 1);
    }

    #[test]
    fn test_each_annotates_index() {
        let v = each(ip_or_cidr());
        let diags = v(&json!(["10.0.0.1", "bad", "10.0.0.0/8"]), &AttributePath::from("addrs"));
        assert_eq!(diags.len(), 1);
        assert!(diags.to_string().starts_with("addrs.1:"));
    }

    #[test]
    fn test_all_collects() {
        let v = all(vec![string_len_between(1, 3), regex_match("^[a-z]+$", "lowercase only")]);
        assert_eq!(errors(&v, json!("ABCD")), 2);
        assert_eq!(errors(&v, json!("abc")), 0);
    }

    #[test]
    fn test_description_limit() {
        let v = description();
        assert_eq!(errors(&v, json!("")), 0);
        assert_eq!(errors(&v, json!("x".repeat(51))), 1);
    }
}
