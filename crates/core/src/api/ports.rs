//! Port interface for the remote dashboard transport

use async_trait::async_trait;
use recreviews_domain::ApiError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Params are sent as a query string
    Get,
    /// Params are sent as a JSON body
    Post,
}

/// One call to the dashboard API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the configured base URL
    pub path: String,
    pub params: Value,
    /// Adds `Authorization: Bearer <token>` when non-empty
    pub access_token: Option<String>,
    /// Merged after the fixed headers; never overrides them
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Value::Object(serde_json::Map::new()),
            access_token: None,
            headers: Vec::new(),
        }
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty()).map(str::to_owned);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Successful transport outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// `200`; `Value::Null` when the body could not be decoded
    Json(Value),
    /// `403`, reported as a value so callers can branch
    Forbidden,
}

impl ApiResponse {
    /// Decoded body of a `200`, `None` for forbidden.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Forbidden => None,
        }
    }

    /// True when the body is an object whose `result` is exactly `true`.
    pub fn is_result_true(&self) -> bool {
        matches!(self, Self::Json(value) if value.get("result") == Some(&Value::Bool(true)))
    }
}

/// Stateless HTTP transport to the dashboard.
///
/// Implementations apply the fixed header set and a per-attempt timeout, and
/// never retry.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Execute one request and map its status to an outcome
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
