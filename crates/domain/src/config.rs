//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_SYNC_LOCK_TTL_SECS, DEFAULT_TIMEOUT_SECS,
    PLATFORM_NAME, REDIRECT_MARKER_PARAM,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub shop: ShopConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote dashboard connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            platform: default_platform(),
        }
    }
}

impl ApiConfig {
    /// Base URL with exactly one trailing slash.
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

/// Host shop identity pushed to the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    pub name: String,
    /// Shop page permalink
    pub url: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub cms_version: String,
    /// Admin locale, sent as `Accept-Language` for onboarding
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub placeholder_image_url: Option<String>,
    /// Settings page URL the authorization server redirects back to
    pub redirect_uri: String,
}

impl ShopConfig {
    /// Redirect URI carrying the `oauth_attempt=1` marker.
    pub fn oauth_redirect_uri(&self) -> String {
        let marker = format!("{REDIRECT_MARKER_PARAM}=1");
        if self.redirect_uri.contains(&marker) {
            return self.redirect_uri.clone();
        }
        let separator = if self.redirect_uri.contains('?') { '&' } else { '?' };
        format!("{}{separator}{marker}", self.redirect_uri)
    }
}

/// Sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Lifetime of the persisted sweep lock
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

/// SQLite storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_platform() -> String {
    PLATFORM_NAME.to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_lock_ttl_secs() -> u64 {
    DEFAULT_SYNC_LOCK_TTL_SECS
}

fn default_db_path() -> String {
    "recreviews.db".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}
