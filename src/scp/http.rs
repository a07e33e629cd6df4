//! HTTP utilities for SCP REST API calls

use crate::config::TlsConfig;
use crate::error::{Error, Result};
use reqwest::{Certificate, Client, Method};
use serde_json::Value;
use std::path::Path;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.get("message"),
            json.get("error").and_then(|e| e.get("message")),
            json.get("errorMessage"),
            json.get("detail"),
        ];
        for c in candidates.into_iter().flatten() {
            if let Some(s) = c.as_str() {
                return s.to_string();
            }
        }
    }
    sanitize_for_log(body)
}

fn load_certificate(path: &Path) -> Option<Certificate> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Failed to read certificate {:?}: {}", path, e);
            return None;
        }
    };
    Certificate::from_pem(&bytes)
        .or_else(|_| Certificate::from_der(&bytes))
        .map_err(|e| tracing::warn!("Ignoring unreadable certificate {:?}: {}", path, e))
        .ok()
}

/// HTTP client wrapper for SCP API calls
///
/// One instance is shared by every service client; it owns the connection
/// pool and TLS configuration.
#[derive(Clone)]
pub struct ScpHttpClient {
    client: Client,
}

impl ScpHttpClient {
    /// Create a new HTTP client trusting the system roots plus the configured
    /// certificate file, with environment proxies disabled
    pub fn new(tls: &TlsConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("scp-provider/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .danger_accept_invalid_certs(tls.insecure_skip_verify);

        match tls.effective_ca_file() {
            Some(path) => {
                if let Some(cert) = load_certificate(&path) {
                    tracing::debug!("Adding trusted certificate from {:?}", path);
                    builder = builder.add_root_certificate(cert);
                }
            }
            None => match &tls.ca_file {
                Some(path) => tracing::warn!("Configured certificate {:?} does not exist", path),
                None => tracing::debug!("No default certificate file, using system roots only"),
            },
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Send one request and decode the JSON response
    ///
    /// Non-2xx responses become [`Error::Api`] carrying the status. An empty
    /// success body decodes as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(Error::Api {
                status: status.as_u16(),
                method: method.to_string(),
                url: url.to_string(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| Error::decode(format!("response of {} {}", method, url), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"x".repeat(200)));
        assert!(out.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"VPC not found"}"#), "VPC not found");
        assert_eq!(
            error_message(r#"{"error":{"code":403,"message":"denied"}}"#),
            "denied"
        );
        assert_eq!(error_message("400 Bad Request"), "400 Bad Request");
    }

    #[test]
    fn test_missing_ca_file_is_not_fatal() {
        let tls = TlsConfig {
            ca_file: Some("/nonexistent/scp.cer".into()),
            insecure_skip_verify: false,
        };
        assert!(ScpHttpClient::new(&tls).is_ok());
    }
}
