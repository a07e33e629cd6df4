//! Diagnostics returned to the host
//!
//! Every lifecycle entry point reports problems as a list of diagnostics with
//! an optional attribute path, rather than a single error value.

use crate::error::Error;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// Path of an attribute inside a resource value tree, e.g. `rules.0.ports`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Key(name.to_string()));
        Self(steps)
    }

    pub fn index(&self, idx: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(idx));
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }
}

impl From<&str> for AttributePath {
    fn from(value: &str) -> Self {
        AttributePath::root().key(value)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| match s {
                PathStep::Key(k) => k.clone(),
                PathStep::Index(i) => i.to_string(),
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(path) if !path.is_root() => write!(f, "{}: {}", path, self.summary)?,
            _ => write!(f, "{}", self.summary)?,
        }
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, path: &AttributePath, summary: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: String::new(),
            attribute: Some(path.clone()),
        });
    }

    pub fn warning(&mut self, path: &AttributePath, summary: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: String::new(),
            attribute: Some(path.clone()),
        });
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Turn error diagnostics into an [`Error::Validation`].
    pub fn into_result(self) -> Result<(), Error> {
        if self.has_errors() {
            Err(Error::Validation(self))
        } else {
            Ok(())
        }
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(diags) => diags,
            other => {
                let mut diags = Diagnostics::new();
                diags.push(Diagnostic {
                    severity: Severity::Error,
                    summary: other.to_string(),
                    detail: String::new(),
                    attribute: None,
                });
                diags
            }
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_path_display() {
        let path = AttributePath::root().key("rules").index(0).key("ports");
        assert_eq!(path.to_string(), "rules.0.ports");
    }

    #[test]
    fn test_into_result_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.warning(&"name".into(), "deprecated");
        assert!(diags.clone().into_result().is_ok());
        diags.error(&"cidr".into(), "invalid CIDR");
        let err = diags.into_result().unwrap_err();
        assert_eq!(err.to_string(), "name: deprecated; cidr: invalid CIDR");
    }

    #[test]
    fn test_from_error() {
        let diags: Diagnostics = Error::Precondition("no bucket".to_string()).into();
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
    }
}
