//! Error types used throughout the application

use thiserror::Error;

use crate::constants::CONFIGURATION_NOTICE;
use crate::types::SyncState;

/// Categories of remote API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Connection failures, missing status, gateway timeouts
    Transport,
    /// 429
    RateLimit,
    /// 500
    Server,
    /// 419, 422 and unclassified status codes
    Client,
    /// 401
    Authentication,
}

/// Outcome of a remote call that did not produce a usable response.
///
/// A `403` is not an error: the transport reports it as a forbidden sentinel
/// so callers can branch on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unknown - {0}")]
    Unknown(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("CSRF token error")]
    CsrfToken,

    #[error("Invalid request")]
    InvalidRequest,

    #[error("Server error")]
    Server,

    #[error("Gateway timeout")]
    Timeout,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP error {status}")]
    Http { status: u16 },
}

impl ApiError {
    /// Map a non-success HTTP status to its error kind.
    ///
    /// Callers handle `200` and `403` before reaching this.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            419 => Self::CsrfToken,
            422 => Self::InvalidRequest,
            500 => Self::Server,
            504 => Self::Timeout,
            401 => Self::Unauthorized,
            other => Self::Http { status: other },
        }
    }

    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unknown(_) | Self::Timeout => ApiErrorCategory::Transport,
            Self::RateLimited => ApiErrorCategory::RateLimit,
            Self::Server => ApiErrorCategory::Server,
            Self::CsrfToken | Self::InvalidRequest | Self::Http { .. } => ApiErrorCategory::Client,
            Self::Unauthorized => ApiErrorCategory::Authentication,
        }
    }

    /// Numeric code reported by the dashboard for this failure.
    pub fn code(&self) -> u8 {
        match self {
            Self::Unauthorized | Self::Http { .. } => 1,
            Self::RateLimited => 2,
            Self::CsrfToken => 4,
            Self::Server => 5,
            Self::Timeout => 6,
            Self::Unknown(_) => 7,
            Self::InvalidRequest => 8,
        }
    }

    /// Stable tag used in structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown(_) => "unknown",
            Self::RateLimited => "rate_limited",
            Self::CsrfToken => "csrf_token",
            Self::InvalidRequest => "invalid_request",
            Self::Server => "server_error",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::Http { .. } => "http_error",
        }
    }

    /// Whether a later sweep can reasonably expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Transport | ApiErrorCategory::RateLimit | ApiErrorCategory::Server
        )
    }
}

/// Authentication failures. These are fatal for the operation attempting
/// them and always reach the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("OAuth state mismatch")]
    CsrfStateMismatch,

    #[error("Authorization code exchange failed: {0}")]
    AuthExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Shop is not authenticated")]
    NotAuthenticated,

    #[error("Missing OAuth session value: {0}")]
    MissingSession(&'static str),

    #[error("{}", CONFIGURATION_NOTICE)]
    ShopConfigurationFailed,

    #[error("{}", CONFIGURATION_NOTICE)]
    RequirementsNotMet,
}

impl AuthError {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CsrfStateMismatch => "csrf_state_mismatch",
            Self::AuthExchangeFailed(_) => "auth_exchange_failed",
            Self::TokenRefreshFailed(_) => "token_refresh_failed",
            Self::NotAuthenticated => "not_authenticated",
            Self::MissingSession(_) => "missing_session",
            Self::ShopConfigurationFailed => "shop_configuration_failed",
            Self::RequirementsNotMet => "requirements_not_met",
        }
    }

    /// True for failures the shop owner sees as the generic configuration
    /// notice.
    pub fn is_configuration_notice(&self) -> bool {
        matches!(self, Self::ShopConfigurationFailed | Self::RequirementsNotMet)
    }
}

/// Main error type for Rec.Reviews
#[derive(Debug, Error)]
pub enum RecReviewsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid sync transition from {from} to {to}")]
    InvalidTransition { from: SyncState, to: SyncState },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecReviewsError {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Api(err) => err.label(),
            Self::Auth(err) => err.label(),
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Internal(_) => "internal",
        }
    }

    /// Authentication failures must surface to the caller instead of being
    /// swallowed by sync batch processing.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<serde_json::Error> for RecReviewsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Rec.Reviews operations
pub type Result<T> = std::result::Result<T, RecReviewsError>;
