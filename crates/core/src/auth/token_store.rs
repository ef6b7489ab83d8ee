//! Persisted OAuth token with expiry-aware refresh
//!
//! The token lives in the config store as a JSON blob. Reading it through
//! [`TokenStore::access_token`] refreshes it transparently once expired.
//!
//! Refresh is single-flight: callers that observe the same expired token
//! queue on one lock, the first refreshes, the rest reuse its result.

use std::sync::Arc;

use recreviews_common::time::Clock;
use recreviews_domain::constants::{
    OPTION_OAUTH_CLIENT_ID, OPTION_OAUTH_CODE_VERIFIER, OPTION_OAUTH_TOKEN,
};
use recreviews_domain::{AccessToken, AuthError, RecReviewsError, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::client::OAuthClient;
use crate::config_store_ports::ConfigStore;

pub struct TokenStore {
    config: Arc<dyn ConfigStore>,
    oauth: OAuthClient,
    clock: Arc<dyn Clock>,
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(config: Arc<dyn ConfigStore>, oauth: OAuthClient, clock: Arc<dyn Clock>) -> Self {
        Self { config, oauth, clock, refresh_lock: Mutex::new(()) }
    }

    /// Stored token as-is, without refreshing.
    ///
    /// A blob that cannot be decoded is treated as absent.
    pub async fn load(&self) -> Result<Option<AccessToken>> {
        let Some(raw) = self.config.get(OPTION_OAUTH_TOKEN).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<AccessToken>(&raw) {
            Ok(token) if !token.access_token.is_empty() => Ok(Some(token)),
            Ok(_) => {
                warn!("stored oauth token has no access token; ignoring");
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "stored oauth token is not decodable; ignoring");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, token: &AccessToken) -> Result<()> {
        if token.access_token.is_empty() {
            return Err(RecReviewsError::Internal("refusing to store an empty access token".into()));
        }
        let blob = serde_json::to_string(token)?;
        self.config.set(OPTION_OAUTH_TOKEN, &blob).await?;
        debug!(expires_at = %token.expires_at, "oauth token stored");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.config.delete(OPTION_OAUTH_TOKEN).await
    }

    /// Whether any token is stored, expired or not.
    pub async fn has_token(&self) -> Result<bool> {
        Ok(self.load().await?.is_some())
    }

    /// Current valid access token, refreshing first when expired.
    ///
    /// # Errors
    /// `TokenRefreshFailed` when the stored token is expired and cannot be
    /// refreshed. The shop must then be treated as unauthenticated.
    pub async fn access_token(&self) -> Result<Option<String>> {
        let Some(token) = self.load().await? else {
            return Ok(None);
        };

        if !token.is_expired(self.clock.now()) {
            return Ok(Some(token.access_token));
        }

        let refreshed = self.refresh_expired(token).await?;
        Ok(refreshed.map(|token| token.access_token).filter(|access| !access.is_empty()))
    }

    /// True when a token exists and yields a non-empty access token.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some())
    }

    #[instrument(skip_all)]
    async fn refresh_expired(&self, observed: AccessToken) -> Result<Option<AccessToken>> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed or cleared while we waited.
        let Some(current) = self.load().await? else {
            return Ok(None);
        };
        if current != observed && !current.is_expired(self.clock.now()) {
            debug!("reusing token refreshed by a concurrent caller");
            return Ok(Some(current));
        }

        if current.refresh_token.is_empty() {
            return Err(AuthError::TokenRefreshFailed("no refresh token stored".into()).into());
        }
        let client_id = self
            .config
            .get(OPTION_OAUTH_CLIENT_ID)
            .await?
            .ok_or_else(|| AuthError::TokenRefreshFailed("no client id stored".into()))?;
        let verifier = self
            .config
            .get(OPTION_OAUTH_CODE_VERIFIER)
            .await?
            .ok_or_else(|| AuthError::TokenRefreshFailed("no code verifier stored".into()))?;

        let response = self.oauth.refresh(&current.refresh_token, &client_id, &verifier).await?;
        let token = AccessToken::issue(response, self.clock.now(), Some(&current.refresh_token))
            .ok_or_else(|| AuthError::TokenRefreshFailed("unusable token response".into()))?;

        self.save(&token).await?;
        info!(expires_at = %token.expires_at, "oauth.token_refreshed");
        Ok(Some(token))
    }
}
