//! Configuration loader
//!
//! Loads the connector configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory when one exists
//! 2. Attempts to load from environment variables
//! 3. If a required variable is missing, falls back to loading from file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `RECREVIEWS_SHOP_NAME`: Shop display name
//! - `RECREVIEWS_SHOP_URL`: Shop page permalink
//! - `RECREVIEWS_SHOP_CMS_VERSION`: Host platform version
//! - `RECREVIEWS_SHOP_REDIRECT_URI`: Settings page the OAuth server redirects to
//!
//! Optional:
//! - `RECREVIEWS_API_URL`: Dashboard base URL
//! - `RECREVIEWS_API_TIMEOUT`: Request timeout in seconds
//! - `RECREVIEWS_SHOP_LOGO_URL`: Shop logo
//! - `RECREVIEWS_SHOP_LOCALE`: Admin and site locale
//! - `RECREVIEWS_PLACEHOLDER_IMAGE_URL`: Image for products without one
//! - `RECREVIEWS_SYNC_ENABLED`: Whether the periodic sweep runs (true/false)
//! - `RECREVIEWS_SYNC_INTERVAL`: Sweep interval in seconds
//! - `RECREVIEWS_SYNC_LOCK_TTL`: Sweep lock lifetime in seconds
//! - `RECREVIEWS_DB_PATH`: Database file path
//! - `RECREVIEWS_DB_POOL_SIZE`: Connection pool size
//! - `RECREVIEWS_LOG_LEVEL`: Default tracing filter
//! - `RECREVIEWS_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./recreviews.toml` or `./recreviews.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use recreviews_domain::{
    ApiConfig, Config, LoggingConfig, RecReviewsError, Result, ShopConfig, StorageConfig,
    SyncConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["recreviews.toml", "recreviews.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `RecReviewsError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The four shop variables are required; everything else keeps its default
/// when unset.
///
/// # Errors
/// Returns `RecReviewsError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let api_defaults = ApiConfig::default();
    let sync_defaults = SyncConfig::default();
    let storage_defaults = StorageConfig::default();
    let logging_defaults = LoggingConfig::default();

    let shop = ShopConfig {
        name: env_var("RECREVIEWS_SHOP_NAME")?,
        url: env_var("RECREVIEWS_SHOP_URL")?,
        logo_url: env_opt("RECREVIEWS_SHOP_LOGO_URL"),
        cms_version: env_var("RECREVIEWS_SHOP_CMS_VERSION")?,
        locale: env_opt("RECREVIEWS_SHOP_LOCALE").unwrap_or_else(|| "en_US".to_string()),
        placeholder_image_url: env_opt("RECREVIEWS_PLACEHOLDER_IMAGE_URL"),
        redirect_uri: env_var("RECREVIEWS_SHOP_REDIRECT_URI")?,
    };

    Ok(Config {
        api: ApiConfig {
            base_url: env_opt("RECREVIEWS_API_URL").unwrap_or(api_defaults.base_url),
            timeout_secs: env_parse("RECREVIEWS_API_TIMEOUT", "API timeout")?
                .unwrap_or(api_defaults.timeout_secs),
            platform: api_defaults.platform,
        },
        shop,
        sync: SyncConfig {
            enabled: env_bool("RECREVIEWS_SYNC_ENABLED", sync_defaults.enabled),
            interval_secs: env_parse("RECREVIEWS_SYNC_INTERVAL", "sync interval")?
                .unwrap_or(sync_defaults.interval_secs),
            lock_ttl_secs: env_parse("RECREVIEWS_SYNC_LOCK_TTL", "sync lock TTL")?
                .unwrap_or(sync_defaults.lock_ttl_secs),
        },
        storage: StorageConfig {
            path: env_opt("RECREVIEWS_DB_PATH").unwrap_or(storage_defaults.path),
            pool_size: env_parse("RECREVIEWS_DB_POOL_SIZE", "pool size")?
                .unwrap_or(storage_defaults.pool_size),
        },
        logging: LoggingConfig {
            level: env_opt("RECREVIEWS_LOG_LEVEL").unwrap_or(logging_defaults.level),
            json: env_bool("RECREVIEWS_LOG_JSON", logging_defaults.json),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RecReviewsError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RecReviewsError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RecReviewsError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RecReviewsError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RecReviewsError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RecReviewsError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(RecReviewsError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `RecReviewsError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        RecReviewsError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional variable; empty values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| RecReviewsError::Config(format!("Invalid {}: {}", what, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
