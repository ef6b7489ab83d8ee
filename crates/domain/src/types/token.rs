//! OAuth token types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Raw body returned by the token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
}

impl TokenResponse {
    /// A usable response carries both a token type and an access token.
    pub fn is_complete(&self) -> bool {
        !self.token_type.is_empty() && !self.access_token.is_empty()
    }
}

/// Persisted OAuth token.
///
/// Only built through [`AccessToken::issue`], so a stored token always has an
/// access token and a computed expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from an endpoint response issued at `now`.
    ///
    /// Returns `None` when the response lacks a token type or access token,
    /// or when `expires_in` puts the expiry outside the representable range.
    /// `previous_refresh` is kept when the response carries no new refresh
    /// token.
    pub fn issue(
        response: TokenResponse,
        now: DateTime<Utc>,
        previous_refresh: Option<&str>,
    ) -> Option<Self> {
        if !response.is_complete() {
            return None;
        }

        let expires_at = Duration::try_seconds(response.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))?;

        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous_refresh.map(str::to_owned))
            .unwrap_or_default();

        Some(Self {
            token_type: response.token_type,
            access_token: response.access_token,
            refresh_token,
            expires_in: response.expires_in,
            expires_at,
        })
    }

    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
