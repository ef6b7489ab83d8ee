//! Application constants
//!
//! Centralized location for persisted keys, remote paths and protocol values
//! shared by every layer.

// Remote API
pub const DEFAULT_API_URL: &str = "https://dashboard.recreviews.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const PLATFORM_NAME: &str = "WooCommerce";
pub const PLATFORM_HEADER: &str = "X-Platform";
pub const ONBOARDING_CMS: &str = "woocommerce";

// Remote paths (relative to the API base URL)
pub const PATH_ONBOARDING: &str = "onboarding-woocommerce";
pub const PATH_MODULE_CONFIGURATION: &str = "api/module/configuration";
pub const PATH_SHOP: &str = "api/shop";
pub const PATH_ORDER_STATUS: &str = "api/orders/status";
pub const PATH_ORDERS: &str = "api/orders";
pub const PATH_MODULE_REVOKE: &str = "api/module/revoke";
pub const PATH_OAUTH_TOKEN: &str = "oauth/token";
pub const PATH_OAUTH_AUTHORIZE: &str = "oauth/authorize";

// OAuth protocol values
pub const CODE_CHALLENGE_METHOD: &str = "S256";
pub const CODE_VERIFIER_LENGTH: usize = 128;
pub const STATE_LENGTH: usize = 40;
pub const REDIRECT_MARKER_PARAM: &str = "oauth_attempt";

// Process-wide option keys
pub const OPTION_OAUTH_STATE: &str = "recreviews_oauth_state";
pub const OPTION_OAUTH_CODE_VERIFIER: &str = "recreviews_oauth_codeVerifier";
pub const OPTION_OAUTH_CLIENT_ID: &str = "recreviews_oauth_clientId";
pub const OPTION_OAUTH_CODE: &str = "recreviews_oauth_code";
pub const OPTION_OAUTH_TOKEN: &str = "recreviews_oauth_token";
pub const OPTION_LAST_SYNC: &str = "recreviews_last_sync";
pub const OPTION_SYNC_LOCK: &str = "recreviews_sync_lock";

/// Every option written by the OAuth flow; removed together on revoke or
/// failed linking.
pub const OAUTH_OPTION_KEYS: [&str; 5] = [
    OPTION_OAUTH_STATE,
    OPTION_OAUTH_CODE_VERIFIER,
    OPTION_OAUTH_CLIENT_ID,
    OPTION_OAUTH_CODE,
    OPTION_OAUTH_TOKEN,
];

// Per-order meta keys
pub const META_STATE: &str = "_recreviews_state";
pub const META_IGNORE: &str = "_recreviews_ignore";
pub const META_SENT_TIMESTAMP: &str = "_recreviews_sent_timestamp";
pub const META_VALID_TIMESTAMP: &str = "_recreviews_valid_timestamp";

// Per-customer meta keys
pub const META_USER_LANG: &str = "_recreviews_user_lang";

// Sync
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_SYNC_LOCK_TTL_SECS: u64 = 600;
pub const LOG_CONTEXT: &str = "rec-reviews";
pub const HOST_STATUS_COMPLETED: &str = "completed";
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Notice shown to the shop owner when linking cannot complete.
pub const CONFIGURATION_NOTICE: &str =
    "Please verify you have defined a logo in your theme, and Shop page in WooCommerce";
