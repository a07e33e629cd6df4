//! Configuration Management
//!
//! Provider settings come from an optional YAML or JSON file overlaid by
//! `SCP_*` environment variables. The result is immutable once the provider
//! is configured.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default convergence window in minutes
const DEFAULT_TIMEOUT_MINUTES: u64 = 120;

/// How requests are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Bearer token in the Authorization header
    #[default]
    Token,
    /// Requests signed with an access key / secret key pair
    Credentials,
    /// Static API key headers
    ApiKey,
}

impl AuthMethod {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "token" => Some(Self::Token),
            "credentials" => Some(Self::Credentials),
            "api-key" | "api_key" | "apikey" => Some(Self::ApiKey),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Credentials => "credentials",
            Self::ApiKey => "api-key",
        }
    }
}

/// TLS settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    /// Extra trusted certificate; defaults to `$HOME/.cmp/scp.cer`
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
    /// Skip server certificate verification. Off unless set explicitly.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Certificate file to add to the system roots, if one exists
    pub fn effective_ca_file(&self) -> Option<PathBuf> {
        let path = self
            .ca_file
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cmp").join("scp.cer")))?;
        path.exists().then_some(path)
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// Base host for most services, e.g. `https://openapi.samsungsdscloud.com`
    #[serde(default)]
    pub service_host: String,
    /// Override host for the storage service path
    #[serde(default)]
    pub oss2_service_host: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub auth_method: AuthMethod,
    /// `access_key:secret_key` for credentials auth, or the API key
    #[serde(default, skip_serializing)]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default = "default_timeout_minutes")]
    pub default_timeout_minutes: u64,
}

fn default_timeout_minutes() -> u64 {
    DEFAULT_TIMEOUT_MINUTES
}

impl ProviderConfig {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scp-provider").join("config.yaml"))
    }

    /// Load from `path` (or the default path when it exists), then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self {
                    default_timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
                    ..Self::default()
                },
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a YAML or JSON file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let is_json = path.extension().is_some_and(|e| e == "json");
        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
    }

    /// Overlay values from `SCP_*` variables
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("SCP_SERVICE_HOST") {
            self.service_host = v;
        }
        if let Some(v) = non_empty("SCP_OSS2_SERVICE_HOST") {
            self.oss2_service_host = Some(v);
        }
        if let Some(v) = non_empty("SCP_PROJECT_ID") {
            self.project_id = v;
        }
        if let Some(v) = non_empty("SCP_USER_ID") {
            self.user_id = Some(v);
        }
        if let Some(v) = non_empty("SCP_EMAIL") {
            self.email = Some(v);
        }
        if let Some(v) = non_empty("SCP_LOGIN_ID") {
            self.login_id = Some(v);
        }
        if let Some(method) = non_empty("SCP_AUTH_METHOD").and_then(|v| AuthMethod::from_str(&v)) {
            self.auth_method = method;
        }
        if let Some(v) = non_empty("SCP_CREDENTIALS") {
            self.credentials = Some(v);
        }
        if let Some(v) = non_empty("SCP_TOKEN") {
            self.token = Some(v);
        }
    }

    /// Check that the settings are usable before building clients
    pub fn validate(&self) -> Result<()> {
        if self.service_host.is_empty() {
            bail!("service_host is required (or set SCP_SERVICE_HOST)");
        }
        if !self.service_host.starts_with("http://") && !self.service_host.starts_with("https://") {
            bail!("service_host must start with http:// or https://");
        }
        if self.project_id.is_empty() {
            bail!("project_id is required (or set SCP_PROJECT_ID)");
        }
        match self.auth_method {
            AuthMethod::Token if self.token.as_deref().unwrap_or("").is_empty() => {
                bail!("auth_method 'token' requires token (or SCP_TOKEN)")
            }
            AuthMethod::Credentials => {
                let creds = self.credentials.as_deref().unwrap_or("");
                if !creds.contains(':') {
                    bail!("auth_method 'credentials' requires credentials as 'access_key:secret_key'");
                }
            }
            AuthMethod::ApiKey if self.credentials.as_deref().unwrap_or("").is_empty() => {
                bail!("auth_method 'api-key' requires credentials holding the API key")
            }
            _ => {}
        }
        if self.tls.insecure_skip_verify {
            tracing::warn!("TLS certificate verification is disabled");
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.default_timeout_minutes.max(1) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> ProviderConfig {
        ProviderConfig {
            service_host: "https://openapi.example.com".to_string(),
            project_id: "PROJECT-1".to_string(),
            token: Some("t".to_string()),
            default_timeout_minutes: 120,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_host() {
        let config = ProviderConfig {
            service_host: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_credentials_format() {
        let mut config = valid();
        config.auth_method = AuthMethod::Credentials;
        config.credentials = Some("nocolon".to_string());
        assert!(config.validate().is_err());
        config.credentials = Some("ak:sk".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SCP_PROJECT_ID", "PROJECT-2"),
            ("SCP_AUTH_METHOD", "api-key"),
            ("SCP_CREDENTIALS", "key"),
            ("SCP_EMAIL", ""),
        ]
        .into_iter()
        .collect();
        let mut config = valid();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.project_id, "PROJECT-2");
        assert_eq!(config.auth_method, AuthMethod::ApiKey);
        assert_eq!(config.credentials.as_deref(), Some("key"));
        assert!(config.email.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "service_host: https://h\nproject_id: P\nauth_method: credentials\ncredentials: a:b\ntls:\n  insecure_skip_verify: true\n";
        let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.auth_method, AuthMethod::Credentials);
        assert!(config.tls.insecure_skip_verify);
        assert_eq!(config.default_timeout_minutes, 120);
    }

    #[test]
    fn test_ca_file_only_when_present() {
        let missing = TlsConfig {
            ca_file: Some("/nonexistent/scp.cer".into()),
            insecure_skip_verify: false,
        };
        assert_eq!(missing.effective_ca_file(), None);

        let present = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let tls = TlsConfig {
            ca_file: Some(present.clone()),
            insecure_skip_verify: false,
        };
        assert_eq!(tls.effective_ca_file(), Some(present));
    }

    #[test]
    fn test_auth_method_roundtrip_names() {
        for m in [AuthMethod::Token, AuthMethod::Credentials, AuthMethod::ApiKey] {
            assert_eq!(AuthMethod::from_str(m.as_str()), Some(m));
        }
    }
}
