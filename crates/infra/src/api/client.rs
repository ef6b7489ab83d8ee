//! Dashboard transport over reqwest
//!
//! Implements [`ApiTransport`]: fixed header set, bearer token when present,
//! query string for GET, JSON body for POST, and status mapping.

use std::time::Duration;

use async_trait::async_trait;
use recreviews_core::{ApiRequest, ApiResponse, ApiTransport, HttpMethod};
use recreviews_domain::constants::PLATFORM_HEADER;
use recreviews_domain::{ApiConfig, ApiError, RecReviewsError};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::transport_error;
use crate::http::HttpClient;

const JSON_MIME: &str = "application/json";
const CONNECTOR_USER_AGENT: &str = concat!("recreviews-connector/", env!("CARGO_PKG_VERSION"));

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL with a trailing slash
    pub base_url: String,
    /// Timeout for one attempt
    pub timeout: Duration,
    /// Value of the platform header
    pub platform: String,
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.normalized_base_url(),
            timeout: Duration::from_secs(config.timeout_secs),
            platform: config.platform.clone(),
        }
    }
}

pub struct ApiClient {
    http_client: HttpClient,
    config: ApiClientConfig,
}

impl ApiClient {
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: ApiClientConfig) -> Result<Self, RecReviewsError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(CONNECTOR_USER_AGENT)
            .build()?;
        Ok(Self { http_client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path.trim_start_matches('/'))
    }

    fn is_fixed_header(&self, name: &str) -> bool {
        [ACCEPT.as_str(), CONTENT_TYPE.as_str(), AUTHORIZATION.as_str(), PLATFORM_HEADER]
            .iter()
            .any(|fixed| fixed.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
impl ApiTransport for ApiClient {
    #[instrument(skip(self, request), fields(path = %request.path, method = ?request.method))]
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);

        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self
            .http_client
            .request(method, &url)
            .header(ACCEPT, JSON_MIME)
            .header(CONTENT_TYPE, JSON_MIME)
            .header(PLATFORM_HEADER, &self.config.platform);

        if let Some(token) = request.access_token.as_deref().filter(|token| !token.is_empty()) {
            builder = builder.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            if self.is_fixed_header(name) {
                debug!(header = %name, "ignoring caller header that shadows a fixed header");
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.method {
            HttpMethod::Get => builder.query(&query_pairs(&request.params)),
            HttpMethod::Post => builder.json(&request.params),
        };

        let response = self.http_client.send(builder).await?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(|err| transport_error(&err))?;
                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(body) => Ok(ApiResponse::Json(body)),
                    Err(err) => {
                        warn!(error = %err, "response body is not valid JSON");
                        Ok(ApiResponse::Json(Value::Null))
                    }
                }
            }
            StatusCode::FORBIDDEN => Ok(ApiResponse::Forbidden),
            status => {
                let err = ApiError::from_status(status.as_u16());
                debug!(%status, error_kind = err.label(), category = ?err.category(), "dashboard returned an error status");
                Err(err)
            }
        }
    }
}

/// Flatten a params object into query pairs.
///
/// Strings are sent as-is, scalars in their JSON form, nulls are skipped and
/// nested values are sent as JSON text.
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}
