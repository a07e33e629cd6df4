//! SCP Authentication
//!
//! Builds the authentication and identity headers attached to every request:
//! a bearer token, an HMAC-SHA256 request signature over an access key /
//! secret key pair, or a static API key, selected by `auth_method`.

use crate::config::{AuthMethod, ProviderConfig};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_PROJECT_ID: &str = "X-Cmp-ProjectId";
pub const HEADER_USER_ID: &str = "X-Cmp-UserId";
pub const HEADER_EMAIL: &str = "X-Cmp-Email";
pub const HEADER_LOGIN_ID: &str = "X-Cmp-LoginId";
pub const HEADER_ACCESS_KEY: &str = "X-Cmp-AccessKey";
pub const HEADER_SIGNATURE: &str = "X-Cmp-Signature";
pub const HEADER_TIMESTAMP: &str = "X-Cmp-Timestamp";
pub const HEADER_CLIENT_TYPE: &str = "X-Cmp-ClientType";
pub const HEADER_API_KEY: &str = "X-Cmp-ApiKey";

/// Client type reported with signed requests
pub const CLIENT_TYPE: &str = "OpenApi";

/// Secret material for one auth method
#[derive(Clone)]
pub enum Credentials {
    Token(String),
    Signed { access_key: String, secret_key: String },
    ApiKey(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print secrets
        match self {
            Credentials::Token(_) => write!(f, "Credentials::Token(..)"),
            Credentials::Signed { access_key, .. } => {
                write!(f, "Credentials::Signed {{ access_key: {}, .. }}", access_key)
            }
            Credentials::ApiKey(_) => write!(f, "Credentials::ApiKey(..)"),
        }
    }
}

impl Credentials {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config.auth_method {
            AuthMethod::Token => config
                .token
                .clone()
                .filter(|t| !t.is_empty())
                .map(Credentials::Token)
                .ok_or_else(|| Error::Config("token auth requires a token".to_string())),
            AuthMethod::Credentials => {
                let creds = config.credentials.as_deref().unwrap_or_default();
                let (access_key, secret_key) = creds.split_once(':').ok_or_else(|| {
                    Error::Config("credentials must be 'access_key:secret_key'".to_string())
                })?;
                Ok(Credentials::Signed {
                    access_key: access_key.to_string(),
                    secret_key: secret_key.to_string(),
                })
            }
            AuthMethod::ApiKey => config
                .credentials
                .clone()
                .filter(|k| !k.is_empty())
                .map(Credentials::ApiKey)
                .ok_or_else(|| Error::Config("api-key auth requires credentials".to_string())),
        }
    }

    /// Authentication headers for one request
    pub fn headers(&self, method: &str, url: &str, project_id: &str) -> Result<Vec<(&'static str, String)>> {
        match self {
            Credentials::Token(token) => Ok(vec![("Authorization", format!("Bearer {}", token))]),
            Credentials::Signed {
                access_key,
                secret_key,
            } => {
                let timestamp = chrono::Utc::now().timestamp_millis().to_string();
                let signature = sign(
                    secret_key, method, url, &timestamp, access_key, project_id, CLIENT_TYPE,
                )?;
                Ok(vec![
                    (HEADER_ACCESS_KEY, access_key.clone()),
                    (HEADER_SIGNATURE, signature),
                    (HEADER_TIMESTAMP, timestamp),
                    (HEADER_CLIENT_TYPE, CLIENT_TYPE.to_string()),
                ])
            }
            Credentials::ApiKey(key) => Ok(vec![(HEADER_API_KEY, key.clone())]),
        }
    }
}

/// Base64 HMAC-SHA256 over the concatenated request fields
pub fn sign(
    secret_key: &str,
    method: &str,
    url: &str,
    timestamp: &str,
    access_key: &str,
    project_id: &str,
    client_type: &str,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| Error::Config(format!("invalid secret key: {}", e)))?;
    let message = format!(
        "{}{}{}{}{}{}",
        method, url, timestamp, access_key, project_id, client_type
    );
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(method: AuthMethod) -> ProviderConfig {
        ProviderConfig {
            service_host: "https://h".to_string(),
            project_id: "P".to_string(),
            auth_method: method,
            token: Some("tok".to_string()),
            credentials: Some("ak:sk".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_token_header() {
        let creds = Credentials::from_config(&config(AuthMethod::Token)).unwrap();
        let headers = creds.headers("GET", "https://h/x", "P").unwrap();
        assert_eq!(headers, vec![("Authorization", "Bearer tok".to_string())]);
    }

    #[test]
    fn test_signed_headers() {
        let creds = Credentials::from_config(&config(AuthMethod::Credentials)).unwrap();
        let headers = creds.headers("POST", "https://h/vpc/v3/vpcs", "P").unwrap();
        let names: Vec<&str> = headers.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec![HEADER_ACCESS_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, HEADER_CLIENT_TYPE]
        );
        assert_eq!(headers[0].1, "ak");
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = sign("sk", "GET", "https://h/x", "1700000000000", "ak", "P", CLIENT_TYPE).unwrap();
        let b = sign("sk", "GET", "https://h/x", "1700000000000", "ak", "P", CLIENT_TYPE).unwrap();
        let c = sign("sk", "GET", "https://h/y", "1700000000000", "ak", "P", CLIENT_TYPE).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // 32-byte digest in base64
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::from_config(&config(AuthMethod::Credentials)).unwrap();
        let text = format!("{:?}", creds);
        assert!(text.contains("ak"));
        assert!(!text.contains("sk"));
    }
}
