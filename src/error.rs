//! Error taxonomy
//!
//! Every fallible operation in the provider returns [`Error`]. The HTTP status
//! of a failed exchange is carried on the error itself, so a service method
//! returning `Result<T>` is the `(value, status, error)` triple: `Ok` means a
//! 2xx exchange, and [`Error::status`] is `0` when the failure happened before
//! any response was received.

use crate::schema::Diagnostics;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which HTTP statuses mean "this resource no longer exists".
///
/// 404 always does. Some services hide deleted resources behind 403, and those
/// resource types opt in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GonePolicy {
    #[default]
    NotFound,
    NotFoundOrForbidden,
}

impl GonePolicy {
    pub fn matches(self, status: u16) -> bool {
        match self {
            GonePolicy::NotFound => status == 404,
            GonePolicy::NotFoundOrForbidden => status == 404 || status == 403,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(Diagnostics),

    #[error("unable to resolve {kind} '{name}'")]
    Resolution { kind: &'static str, name: String },

    #[error("{method} {url} failed with status {status}: {message}")]
    Api {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timeout after {timeout:?} waiting for {resource} to reach {target:?} (last state: {last_state})")]
    Timeout {
        resource: String,
        target: Vec<String>,
        last_state: String,
        timeout: Duration,
    },

    #[error("unexpected state '{state}' for {resource}, wanted {target:?}")]
    UnexpectedState {
        resource: String,
        state: String,
        target: Vec<String>,
    },

    #[error("{0}")]
    Precondition(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {action} tag '{key}' on resource {resource_id}: {source}")]
    Tag {
        action: &'static str,
        resource_id: String,
        key: String,
        #[source]
        source: Box<Error>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of the failed exchange, or 0 if no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Error::Api { status, .. } => *status,
            Error::Transport(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            Error::Tag { source, .. } => source.status(),
            _ => 0,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }

    /// Whether this error means the resource is gone under the given policy.
    pub fn is_deleted_equivalent(&self, policy: GonePolicy) -> bool {
        policy.matches(self.status())
    }

    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Decode {
            what: what.into(),
            source,
        }
    }

    pub fn resolution(kind: &'static str, name: impl Into<String>) -> Self {
        Error::Resolution {
            kind,
            name: name.into(),
        }
    }
}

/// Known server error prefixes and the messages shown instead.
///
/// The API answers some invalid requests with a bare "400 Bad Request" style
/// message; these are replaced with something the user can act on.
const KNOWN_BAD_REQUESTS: &[(&str, &str, &str)] = &[
    (
        "/firewall/",
        "loggable",
        "firewall logging requires a log-storage bucket to be configured for the project",
    ),
    (
        "/load-balancer/",
        "already in use",
        "the load balancer profile is still attached to a server group or service",
    ),
    (
        "/subnet/",
        "overlap",
        "the subnet CIDR overlaps another subnet in the same VPC",
    ),
];

/// Re-wrap an API error with a more informative message for known cases.
pub fn translate(err: Error) -> Error {
    match err {
        Error::Api {
            status: 400,
            ref url,
            ref message,
            ..
        } => {
            let lower = message.to_lowercase();
            for (path, needle, replacement) in KNOWN_BAD_REQUESTS {
                if url.contains(path) && (lower.contains(needle) || lower.starts_with("400 bad request")) {
                    return Error::Precondition((*replacement).to_string());
                }
            }
            err
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, url: &str, message: &str) -> Error {
        Error::Api {
            status,
            method: "PUT".to_string(),
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_zero_without_exchange() {
        assert_eq!(Error::Cancelled.status(), 0);
        assert_eq!(Error::resolution("region", "KR-WEST").status(), 0);
        assert_eq!(api(404, "/vpc/v2/vpcs/x", "").status(), 404);
    }

    #[test]
    fn test_gone_policy() {
        let forbidden = api(403, "/x", "forbidden");
        assert!(!forbidden.is_deleted_equivalent(GonePolicy::NotFound));
        assert!(forbidden.is_deleted_equivalent(GonePolicy::NotFoundOrForbidden));
        assert!(api(404, "/x", "").is_deleted_equivalent(GonePolicy::NotFound));
        assert!(!api(500, "/x", "").is_deleted_equivalent(GonePolicy::NotFoundOrForbidden));
    }

    #[test]
    fn test_tag_error_keeps_status() {
        let err = Error::Tag {
            action: "detach",
            resource_id: "vpc-1".to_string(),
            key: "env".to_string(),
            source: Box::new(api(409, "/tag/v2/x", "conflict")),
        };
        assert_eq!(err.status(), 409);
        assert!(err.to_string().contains("vpc-1"));
        assert!(err.to_string().contains("env"));
    }

    #[test]
    fn test_translate_known_bad_request() {
        let err = translate(api(
            400,
            "https://h/firewall/v2/firewalls/fw-1/logging",
            "400 Bad Request",
        ));
        assert!(matches!(err, Error::Precondition(ref m) if m.contains("log-storage bucket")));
    }

    #[test]
    fn test_translate_leaves_others() {
        let err = translate(api(400, "https://h/vpc/v2/vpcs", "invalid name"));
        assert!(matches!(err, Error::Api { status: 400, .. }));
        let err = translate(api(500, "https://h/firewall/v2/x", "400 Bad Request"));
        assert!(matches!(err, Error::Api { status: 500, .. }));
    }
}
