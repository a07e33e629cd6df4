//! SCP Client
//!
//! Main client for the SCP REST API: resolves per-service base URLs, attaches
//! tenant, identity and authentication headers, and decodes typed responses.
//! Cloning is cheap; every clone shares one connection pool.

use super::auth::{
    Credentials, HEADER_EMAIL, HEADER_LOGIN_ID, HEADER_PROJECT_ID, HEADER_USER_ID,
};
use super::http::ScpHttpClient;
use super::types::Page;
use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Cloud services, each rooted at its own path under the service host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Project,
    Product,
    Vpc,
    Subnet,
    PublicIp,
    InternetGateway,
    NatGateway,
    Firewall,
    BlockStorage,
    FileStorage,
    Kubernetes,
    LoadBalancer,
    Iam,
    Tag,
}

impl Service {
    pub fn path(&self) -> &'static str {
        match self {
            Service::Project => "project",
            Service::Product => "product",
            Service::Vpc => "vpc",
            Service::Subnet => "subnet",
            Service::PublicIp => "public-ip",
            Service::InternetGateway => "internet-gateway",
            Service::NatGateway => "nat-gateway",
            Service::Firewall => "firewall",
            Service::BlockStorage => "block-storage",
            Service::FileStorage => "file-storage",
            Service::Kubernetes => "kubernetes-engine",
            Service::LoadBalancer => "load-balancer",
            Service::Iam => "iam",
            Service::Tag => "tag",
        }
    }

    /// Storage services may live on a separate host
    pub fn uses_storage_host(&self) -> bool {
        matches!(self, Service::BlockStorage | Service::FileStorage)
    }
}

/// Query parameters; unset options are omitted entirely, never sent empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn page(self, page: Page) -> Self {
        self.set("page", page.page).set("size", page.size)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encode one path segment
pub fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

struct Inner {
    http: ScpHttpClient,
    credentials: Credentials,
    host: String,
    storage_host: Option<String>,
    project_id: String,
    user_id: Option<String>,
    email: Option<String>,
    login_id: Option<String>,
    default_timeout: Duration,
}

/// Main SCP client
#[derive(Clone)]
pub struct ScpClient {
    inner: Arc<Inner>,
}

fn normalize_host(host: &str) -> Result<String> {
    Url::parse(host).map_err(|e| Error::Config(format!("invalid host '{}': {}", host, e)))?;
    Ok(host.trim_end_matches('/').to_string())
}

impl ScpClient {
    /// Create a new SCP client
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let http = ScpHttpClient::new(&config.tls)?;
        let storage_host = match config.oss2_service_host.as_deref() {
            Some(h) if !h.is_empty() => Some(normalize_host(h)?),
            _ => None,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                credentials,
                host: normalize_host(&config.service_host)?,
                storage_host,
                project_id: config.project_id.clone(),
                user_id: config.user_id.clone(),
                email: config.email.clone(),
                login_id: config.login_id.clone(),
                default_timeout: config.default_timeout(),
            }),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Convergence window applied when an adapter has no override
    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    /// Base URL of one service: `<host>/<service-path>`
    pub fn base_url(&self, service: Service) -> String {
        let host = match (&self.inner.storage_host, service.uses_storage_host()) {
            (Some(h), true) => h,
            _ => &self.inner.host,
        };
        format!("{}/{}", host, service.path())
    }

    pub fn url(&self, service: Service, path: &str, query: &Query) -> String {
        let mut url = format!("{}/{}", self.base_url(service), path.trim_start_matches('/'));
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.encode());
        }
        url
    }

    fn headers(&self, method: &Method, url: &str) -> Result<Vec<(&'static str, String)>> {
        let inner = &self.inner;
        let mut headers = vec![
            (HEADER_PROJECT_ID, inner.project_id.clone()),
            ("X-Request-Id", uuid::Uuid::new_v4().to_string()),
        ];
        if let Some(v) = &inner.user_id {
            headers.push((HEADER_USER_ID, v.clone()));
        }
        if let Some(v) = &inner.email {
            headers.push((HEADER_EMAIL, v.clone()));
        }
        if let Some(v) = &inner.login_id {
            headers.push((HEADER_LOGIN_ID, v.clone()));
        }
        headers.extend(
            inner
                .credentials
                .headers(method.as_str(), url, &inner.project_id)?,
        );
        Ok(headers)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        service: Service,
        path: &str,
        query: &Query,
        body: Option<Value>,
    ) -> Result<T> {
        let url = self.url(service, path, query);
        let headers = self.headers(&method, &url)?;
        let value = ctx
            .run(self.inner.http.send(method.clone(), &url, &headers, body.as_ref()))
            .await?;
        // bodiless responses decode as empty objects
        let value = if value.is_null() {
            Value::Object(Default::default())
        } else {
            value
        };
        serde_json::from_value(value).map_err(|e| Error::decode(format!("response of {} {}", method, url), e))
    }

    /// Make a GET request to an SCP API
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        service: Service,
        path: &str,
        query: &Query,
    ) -> Result<T> {
        self.request(ctx, Method::GET, service, path, query, None)
            .await
    }

    /// Make a POST request to an SCP API
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| Error::decode("request body", e))?;
        self.request(ctx, Method::POST, service, path, &Query::new(), Some(body))
            .await
    }

    /// Make a PUT request to an SCP API
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| Error::decode("request body", e))?;
        self.request(ctx, Method::PUT, service, path, &Query::new(), Some(body))
            .await
    }

    /// Make a DELETE request to an SCP API
    pub async fn delete<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        service: Service,
        path: &str,
    ) -> Result<T> {
        self.request(ctx, Method::DELETE, service, path, &Query::new(), None)
            .await
    }

    /// Make a DELETE request with a JSON body
    pub async fn delete_with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| Error::decode("request body", e))?;
        self.request(ctx, Method::DELETE, service, path, &Query::new(), Some(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(storage: Option<&str>) -> ScpClient {
        let config = ProviderConfig {
            service_host: "https://openapi.example.com/".to_string(),
            oss2_service_host: storage.map(str::to_string),
            project_id: "PROJECT-1".to_string(),
            token: Some("t".to_string()),
            default_timeout_minutes: 120,
            ..Default::default()
        };
        ScpClient::new(&config).unwrap()
    }

    #[test]
    fn test_base_urls() {
        let c = client(None);
        assert_eq!(c.base_url(Service::Vpc), "https://openapi.example.com/vpc");
        assert_eq!(
            c.base_url(Service::BlockStorage),
            "https://openapi.example.com/block-storage"
        );
    }

    #[test]
    fn test_storage_host_override() {
        let c = client(Some("https://oss2.example.com"));
        assert_eq!(c.base_url(Service::BlockStorage), "https://oss2.example.com/block-storage");
        assert_eq!(c.base_url(Service::Subnet), "https://openapi.example.com/subnet");
    }

    #[test]
    fn test_query_omits_unset() {
        let q = Query::new()
            .opt("vpcName", None::<String>)
            .opt("vpcState", Some("ACTIVE"))
            .set("page", 0);
        assert_eq!(q.encode(), "vpcState=ACTIVE&page=0");
        let c = client(None);
        assert_eq!(
            c.url(Service::Vpc, "/v2/vpcs", &q),
            "https://openapi.example.com/vpc/v2/vpcs?vpcState=ACTIVE&page=0"
        );
    }

    #[test]
    fn test_empty_string_is_kept() {
        let q = Query::new().opt("vpcName", Some(""));
        assert_eq!(q.encode(), "vpcName=");
    }

    #[test]
    fn test_headers_carry_project() {
        let c = client(None);
        let headers = c.headers(&Method::GET, "https://x").unwrap();
        assert!(headers.contains(&(HEADER_PROJECT_ID, "PROJECT-1".to_string())));
        assert!(headers.iter().any(|(k, v)| *k == "Authorization" && v == "Bearer t"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = ProviderConfig {
            service_host: "not a url".to_string(),
            project_id: "P".to_string(),
            token: Some("t".to_string()),
            ..Default::default()
        };
        assert!(ScpClient::new(&config).is_err());
    }
}
