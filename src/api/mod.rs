//! REST plumbing shared by every command.
//!
//! `Request` describes one call against a PrivX microservice, `Connector`
//! executes it. Handlers only depend on the trait, so tests swap in the
//! recording stub from `stub.rs`.
//!
//! Helpers: parse_base_url / endpoint_url / call / call_items / download.

use std::fmt;
use std::future::Future;
use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::error::ApiError;

pub mod auth;
pub mod http;
#[cfg(test)]
pub mod stub;

pub use http::HttpConnector;

/// PrivX microservices, each serving under `/<name>/api/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Authorizer,
    ConnectionManager,
    DbProxy,
    HostStore,
    LicenseManager,
    LocalUserStore,
    MonitorService,
    NetworkAccessManager,
    RoleStore,
    Settings,
    TrailIndex,
    Vault,
    WorkflowEngine,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Auth => "auth",
            Service::Authorizer => "authorizer",
            Service::ConnectionManager => "connection-manager",
            Service::DbProxy => "db-proxy",
            Service::HostStore => "host-store",
            Service::LicenseManager => "license-manager",
            Service::LocalUserStore => "local-user-store",
            Service::MonitorService => "monitor-service",
            Service::NetworkAccessManager => "network-access-manager",
            Service::RoleStore => "role-store",
            Service::Settings => "settings",
            Service::TrailIndex => "trail-index",
            Service::Vault => "vault",
            Service::WorkflowEngine => "workflow-engine",
        }
    }

    /// Path prefix, e.g. `/host-store/api/v1`.
    pub fn prefix(&self) -> String {
        format!("/{}/api/v1", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// A single REST call, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub service: Service,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, service: Service, path: impl Into<String>) -> Self {
        Request {
            method,
            service,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(service: Service, path: impl Into<String>) -> Self {
        Self::new(Method::Get, service, path)
    }

    pub fn post(service: Service, path: impl Into<String>) -> Self {
        Self::new(Method::Post, service, path)
    }

    pub fn put(service: Service, path: impl Into<String>) -> Self {
        Self::new(Method::Put, service, path)
    }

    pub fn delete(service: Service, path: impl Into<String>) -> Self {
        Self::new(Method::Delete, service, path)
    }

    /// Append a query parameter; empty values are dropped.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.query.push((key.to_string(), value));
        }
        self
    }

    /// Append a query parameter only when `value` is present.
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Full path including the service prefix.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.service.prefix(), self.path)
    }
}

/// Executes requests against a PrivX deployment.
///
/// Returns the raw response body of a successful (2xx) reply; anything else
/// must surface as an `ApiError`.
pub trait Connector {
    fn send(&self, request: Request) -> impl Future<Output = Result<Vec<u8>, ApiError>>;

    /// Bearer token used by this connector, when it has one. Connectors that
    /// authenticate lazily obtain the token here on first use.
    fn access_token(&self) -> impl Future<Output = Result<Option<String>, ApiError>> {
        async { Ok(None) }
    }
}

/* ---- Response helpers ---- */

/// Send a request and decode the reply as JSON (`null` for an empty body).
pub async fn call<C: Connector>(api: &C, request: Request) -> Result<Value, ApiError> {
    let body = api.send(request).await?;
    decode(&body)
}

/// Like `call`, but unwrap the `items` array of paged collection replies.
pub async fn call_items<C: Connector>(api: &C, request: Request) -> Result<Value, ApiError> {
    call(api, request).await.map(items)
}

/// Send a request and write the raw reply body to `path`.
pub async fn download<C: Connector>(
    api: &C,
    request: Request,
    path: &Path,
) -> Result<(), ApiError> {
    let body = api.send(request).await?;
    tracing::debug!(path = %path.display(), bytes = body.len(), "writing download");
    std::fs::write(path, body)?;
    Ok(())
}

pub fn decode(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

/// `{"count": n, "items": [...]}` -> `[...]`; any other shape is returned as is.
pub fn items(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("items") => {
            map.remove("items").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Read the `session_id` from a download handle reply.
pub fn session_id(handle: &Value) -> Result<String, ApiError> {
    handle
        .get("session_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Config("download handle is missing session_id".to_string()))
}

/* ---- URL helpers ---- */

/// Validate a user supplied PrivX base URL.
///
/// Accepts absolute `http`/`https` URLs. A trailing slash is tolerated.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Config("base url is empty".to_string()));
    }
    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ApiError::Config(format!(
                "unsupported url scheme '{other}' in {trimmed} (expected http or https)"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(ApiError::Config(format!("base url has no host: {trimmed}")));
    }
    Ok(url)
}

/// Join the base URL with a request's path and query.
pub fn endpoint_url(base: &Url, request: &Request) -> Result<Url, ApiError> {
    let mut url = base.clone();
    let root = base.path().trim_end_matches('/');
    url.set_path(&format!("{root}{}", request.full_path()));
    url.set_query(None);
    if !request.query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_drops_empty_values() {
        let req = Request::get(Service::HostStore, "/hosts")
            .query("offset", 0)
            .query("limit", 50)
            .query("sortkey", "")
            .query("sortdir", "ASC")
            .query_opt("filter", None::<String>);
        assert_eq!(
            req.query,
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("sortdir".to_string(), "ASC".to_string()),
            ]
        );
        assert_eq!(req.full_path(), "/host-store/api/v1/hosts");
    }

    #[test]
    fn base_url_validation() {
        assert!(parse_base_url("https://privx.example.com").is_ok());
        assert!(parse_base_url("http://10.0.0.1:8080/").is_ok());
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("ftp://privx.example.com").is_err());
        assert!(parse_base_url("privx.example.com").is_err());
    }

    #[test]
    fn endpoint_url_joins_prefix_path_and_query() {
        let base = parse_base_url("https://privx.example.com/").unwrap();
        let req = Request::get(Service::Vault, "/secrets/db password")
            .query("offset", 0)
            .query("filter", "a&b");
        let url = endpoint_url(&base, &req).unwrap();
        assert_eq!(
            url.as_str(),
            "https://privx.example.com/vault/api/v1/secrets/db%20password?offset=0&filter=a%26b"
        );

        let base = parse_base_url("https://gw.example.com/privx").unwrap();
        let url = endpoint_url(&base, &Request::get(Service::Auth, "/oauth/token")).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.com/privx/auth/api/v1/oauth/token");
    }

    #[test]
    fn items_unwraps_paged_replies_only() {
        assert_eq!(items(json!({"count": 1, "items": [{"id": "a"}]})), json!([{"id": "a"}]));
        assert_eq!(items(json!({"id": "a"})), json!({"id": "a"}));
        assert_eq!(items(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn decode_empty_body_is_null() {
        assert_eq!(decode(b"").unwrap(), Value::Null);
        assert_eq!(decode(b" \n").unwrap(), Value::Null);
        assert_eq!(decode(br#"{"id":"x"}"#).unwrap(), json!({"id": "x"}));
        assert!(decode(b"not json").is_err());
    }

    #[test]
    fn session_id_is_required() {
        assert_eq!(session_id(&json!({"session_id": "s1"})).unwrap(), "s1");
        assert!(session_id(&json!({})).is_err());
    }
}
