use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use log::debug;
use reqwest::blocking::multipart::Form;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::session::{NoSession, SessionResolver};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Origin used only to parse relative paths. Never contacted.
const PARSE_ORIGIN: &str = "https://example.com";

/// Safely slice a string at UTF-8 character boundaries.
fn safe_slice(s: &str, start: usize, end: usize) -> &str {
    let start = s.floor_char_boundary(start);
    let end = s.ceil_char_boundary(end.min(s.len()));
    &s[start..end]
}

/// Truncate a string for log output, appending "..." if truncated.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", safe_slice(s, 0, max_len))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Trailing slash in API path \"{0}\". Remove it: the API treats a trailing slash as a different, deprecated route.")]
    TrailingSlash(String),

    #[error("Missing trailing slash in API path \"{0}\". Add one: the API only routes slash-terminated paths.")]
    MissingTrailingSlash(String),

    #[error("Double slashes detected in API path \"{0}\". The URL is probably built wrong.")]
    DoubleSlash(String),

    #[error("Invalid API path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Trailing-slash convention enforced on every request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlashPolicy {
    /// Reject paths whose route ends in `/`.
    #[default]
    ForbidTrailing,
    /// Reject paths whose route does not end in `/`.
    RequireTrailing,
}

/// Validate a request path against the slash policy and the double-separator rule.
pub fn check_path(path: &str, policy: SlashPolicy) -> Result<(), ApiError> {
    // Url parsing would read a leading `//` as a host, hiding the doubled separator.
    if path.starts_with("//") {
        return Err(ApiError::DoubleSlash(path.to_string()));
    }

    let parsed = Url::parse(PARSE_ORIGIN)
        .and_then(|origin| origin.join(path))
        .map_err(|e| ApiError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    let route = parsed.path();

    match policy {
        SlashPolicy::ForbidTrailing if route.ends_with('/') => {
            return Err(ApiError::TrailingSlash(path.to_string()));
        }
        SlashPolicy::RequireTrailing if !route.ends_with('/') => {
            return Err(ApiError::MissingTrailingSlash(path.to_string()));
        }
        _ => {}
    }

    if route.contains("//") {
        return Err(ApiError::DoubleSlash(path.to_string()));
    }

    Ok(())
}

/// HTTP verbs the client issues. DELETE is intentionally absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<(String, String)>),
}

/// A single outbound request, built by a caller and consumed by [`ApiClient::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            query: Vec::new(),
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn multipart(mut self, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.body = Some(RequestBody::Multipart(fields));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach an explicit credential. The client never replaces it.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

}

/// Settings shared by every request issued through one [`ApiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub slash_policy: SlashPolicy,
    pub credentials: Arc<dyn SessionResolver>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            default_headers: vec![
                ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            slash_policy: SlashPolicy::default(),
            credentials: Arc::new(NoSession),
        }
    }

    /// Add or replace a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_slash_policy(mut self, policy: SlashPolicy) -> Self {
        self.slash_policy = policy;
        self
    }

    pub fn with_credentials(mut self, resolver: Arc<dyn SessionResolver>) -> Self {
        self.credentials = resolver;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("slash_policy", &self.slash_policy)
            .finish_non_exhaustive()
    }
}

/// Single choke point for outbound calls to the journal API.
///
/// Every request is checked against the configured [`SlashPolicy`] before
/// anything is sent. Requests without an explicit `Authorization` header get
/// the session credential; the first credential found is cached on the client
/// and reused for the rest of its lifetime.
pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
    cached_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::NetworkError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            cached_token: RwLock::new(None),
        })
    }

    pub fn get(&self, path: impl Into<String>) -> ApiRequest {
        ApiRequest::new(Method::Get, path)
    }

    pub fn post(&self, path: impl Into<String>) -> ApiRequest {
        ApiRequest::new(Method::Post, path)
    }

    pub fn put(&self, path: impl Into<String>) -> ApiRequest {
        ApiRequest::new(Method::Put, path)
    }

    pub fn patch(&self, path: impl Into<String>) -> ApiRequest {
        ApiRequest::new(Method::Patch, path)
    }

    /// The credential cached from an earlier session lookup, if any.
    fn cached_credential(&self) -> Option<String> {
        self.cached_token.read().ok().and_then(|token| token.clone())
    }

    /// Bearer token for a request lacking an explicit credential.
    fn session_token(&self) -> Option<String> {
        if let Some(token) = self.cached_credential() {
            return Some(token);
        }

        let session = self.config.credentials.current_session()?;
        if session.api_token.is_empty() {
            return None;
        }
        debug!("  attaching session credential ({} chars)", session.api_token.len());

        if let Ok(mut cached) = self.cached_token.write() {
            *cached = Some(session.api_token.clone());
        }
        Some(session.api_token)
    }

    fn resolve_url(&self, path: &str) -> Result<Url, ApiError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }

        let base = self.config.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).map_err(|e| ApiError::InvalidPath {
            path: path.to_string(),
            reason: format!("cannot join with base URL {}: {}", base, e),
        })
    }

    /// Whether `url` points at the configured API host. Absolute URLs
    /// elsewhere never receive the session credential.
    fn is_api_origin(&self, url: &Url) -> bool {
        Url::parse(&self.config.base_url)
            .map(|base| base.origin() == url.origin())
            .unwrap_or(false)
    }

    /// Request headers override defaults of the same name.
    fn merged_headers<'a>(&'a self, request: &'a ApiRequest) -> Vec<(&'a str, &'a str)> {
        let mut headers: Vec<(&str, &str)> = self
            .config
            .default_headers
            .iter()
            .filter(|(name, _)| {
                !request
                    .headers
                    .iter()
                    .any(|(own, _)| own.eq_ignore_ascii_case(name))
            })
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        headers.extend(request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        headers
    }

    fn transport_error(&self, e: reqwest::Error, start: Instant) -> ApiError {
        debug!("  network error after {:?}: {}", start.elapsed(), e);
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::NetworkError(e.to_string())
        }
    }

    /// Validate, authenticate and dispatch a request, decoding a JSON response.
    pub fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        check_path(&request.path, self.config.slash_policy)?;
        let url = self.resolve_url(&request.path)?;

        let headers = self.merged_headers(&request);
        let explicit_credential = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"));

        let mut builder = self.http.request(request.method.as_reqwest(), url.clone());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        // Only requests to the configured API get the session credential.
        if !explicit_credential && self.is_api_origin(&url) {
            if let Some(token) = self.session_token() {
                builder = builder.bearer_auth(token);
            }
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Some(RequestBody::Json(body)) => {
                let body_json = body.to_string();
                debug!("  request body: {}", truncate_for_log(&body_json, 200));
                builder.json(body)
            }
            Some(RequestBody::Multipart(fields)) => {
                let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                debug!("  multipart fields: {}", names.join(", "));
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()));
                builder.multipart(form)
            }
            None => builder,
        };

        debug!("{} {} ({} query params)", request.method, url, request.query.len());

        let start = Instant::now();
        let response = builder
            .send()
            .map_err(|e| self.transport_error(e, start))?;

        let status = response.status();
        debug!("  response: {} in {:?}", status, start.elapsed());

        let body = response
            .text()
            .map_err(|e| self.transport_error(e, start))?;
        debug!("  response body: {} bytes", body.len());

        if !status.is_success() {
            debug!("  error body: {}", truncate_for_log(&body, 500));
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| {
            debug!("  deserialization error: {}", e);
            ApiError::InvalidResponse(format!(
                "{}\n\nResponse body:\n{}",
                e,
                truncate_for_log(&body, 500)
            ))
        })
    }
}
