//! Shop linking through OAuth 2.0 authorization code + PKCE
//!
//! Lifecycle:
//! 1. [`OAuthFlow::prepare_session`] persists a CSRF state and verifier
//! 2. The admin follows [`OAuthFlow::authorization_url`]
//! 3. The redirect lands in [`OAuthFlow::handle_redirect`], which exchanges
//!    the code and pushes the shop configuration
//! 4. [`OAuthFlow::revoke`] unlinks the shop

use std::sync::Arc;

use recreviews_common::auth::pkce;
use recreviews_common::time::Clock;
use recreviews_domain::constants::{
    CODE_VERIFIER_LENGTH, OAUTH_OPTION_KEYS, OPTION_OAUTH_CLIENT_ID, OPTION_OAUTH_CODE,
    OPTION_OAUTH_CODE_VERIFIER, OPTION_OAUTH_STATE, PATH_OAUTH_AUTHORIZE, PLATFORM_NAME,
    REDIRECT_MARKER_PARAM,
};
use recreviews_domain::{
    AccessToken, AccountStatus, AuthError, ConfigurationPayload, OAuthSession, RecReviewsError,
    Result, ShopConfig, ShopConfiguration, TokenResponse,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::OAuthClient;
use super::token_store::TokenStore;
use crate::api::RemoteApi;
use crate::config_store_ports::ConfigStore;

/// Query parameters the authorization server appends to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    pub code: String,
    pub state: String,
    pub client_id: String,
}

impl AuthorizationRedirect {
    /// Parse a redirect query string.
    ///
    /// `None` unless the `oauth_attempt` marker is present, so unrelated
    /// visits to the settings page are ignored.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.trim_start_matches('?');
        let mut marker = false;
        let (mut code, mut state, mut client_id) = (None, None, None);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                REDIRECT_MARKER_PARAM => marker = true,
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "client_id" => client_id = Some(value.into_owned()),
                _ => {}
            }
        }

        if !marker {
            return None;
        }

        Some(Self {
            code: code.unwrap_or_default(),
            state: state.unwrap_or_default(),
            client_id: client_id.unwrap_or_default(),
        })
    }
}

pub struct OAuthFlow {
    config: Arc<dyn ConfigStore>,
    tokens: Arc<TokenStore>,
    oauth: OAuthClient,
    api: Arc<RemoteApi>,
    clock: Arc<dyn Clock>,
    shop: ShopConfig,
    api_base_url: String,
}

impl OAuthFlow {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        tokens: Arc<TokenStore>,
        oauth: OAuthClient,
        api: Arc<RemoteApi>,
        clock: Arc<dyn Clock>,
        shop: ShopConfig,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self { config, tokens, oauth, api, clock, shop, api_base_url: api_base_url.into() }
    }

    /// Generate and persist a fresh state and verifier while unlinked.
    ///
    /// No-op once a token is stored. Returns the session that is current
    /// afterwards, `None` when linked.
    #[instrument(skip(self))]
    pub async fn prepare_session(&self) -> Result<Option<OAuthSession>> {
        if self.tokens.has_token().await? {
            return Ok(None);
        }

        let session = OAuthSession::new(
            pkce::generate_state(),
            pkce::generate_code_verifier(CODE_VERIFIER_LENGTH),
        );
        self.config.set(OPTION_OAUTH_STATE, &session.state).await?;
        self.config.set(OPTION_OAUTH_CODE_VERIFIER, &session.code_verifier).await?;
        debug!("oauth session prepared");

        Ok(Some(session))
    }

    /// Session values currently persisted, `None` when state or verifier
    /// is missing.
    pub async fn session(&self) -> Result<Option<OAuthSession>> {
        let state = self.config.get(OPTION_OAUTH_STATE).await?;
        let verifier = self.config.get(OPTION_OAUTH_CODE_VERIFIER).await?;

        let (Some(state), Some(verifier)) = (state, verifier) else {
            return Ok(None);
        };

        let mut session = OAuthSession::new(state, verifier);
        session.client_id = self.config.get(OPTION_OAUTH_CLIENT_ID).await?;
        session.authorization_code = self.config.get(OPTION_OAUTH_CODE).await?;
        Ok(Some(session))
    }

    /// Authorization endpoint URL for `session`.
    pub fn authorization_url(&self, session: &OAuthSession) -> Result<String> {
        let authorize = format!("{}{PATH_OAUTH_AUTHORIZE}", self.api_base_url);
        let mut url = Url::parse(&authorize)
            .map_err(|err| RecReviewsError::Config(format!("invalid api base url: {err}")))?;

        url.query_pairs_mut()
            .append_pair("redirect_uri", &self.shop.oauth_redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("code_challenge", &pkce::code_challenge(&session.code_verifier))
            .append_pair("code_challenge_method", pkce::CHALLENGE_METHOD)
            .append_pair("scope", "")
            .append_pair("state", &session.state)
            .append_pair("cms_name", PLATFORM_NAME)
            .append_pair("shop_url", self.shop.url.trim_end_matches('/'));

        Ok(url.into())
    }

    /// Complete linking from the authorization redirect.
    ///
    /// # Errors
    /// - `MissingSession` when a redirect parameter or the stored verifier
    ///   is missing
    /// - `CsrfStateMismatch` when `state` differs from the stored state;
    ///   nothing is persisted and no exchange is attempted
    /// - `AuthExchangeFailed` when the token endpoint rejects the code
    /// - `ShopConfigurationFailed` when the configuration push fails; all
    ///   OAuth options are removed
    #[instrument(skip_all)]
    pub async fn handle_redirect(&self, code: &str, state: &str, client_id: &str) -> Result<AccessToken> {
        if code.is_empty() {
            return Err(AuthError::MissingSession("code").into());
        }
        if state.is_empty() {
            return Err(AuthError::MissingSession("state").into());
        }
        if client_id.is_empty() {
            return Err(AuthError::MissingSession("client_id").into());
        }

        let expected = self.config.get(OPTION_OAUTH_STATE).await?.unwrap_or_default();
        if !pkce::validate_state(&expected, state) {
            warn!("oauth redirect state does not match the stored state");
            return Err(AuthError::CsrfStateMismatch.into());
        }

        self.config.set(OPTION_OAUTH_CODE, code).await?;
        self.config.set(OPTION_OAUTH_CLIENT_ID, client_id).await?;

        let verifier = self
            .config
            .get(OPTION_OAUTH_CODE_VERIFIER)
            .await?
            .filter(|verifier| !verifier.is_empty())
            .ok_or(AuthError::MissingSession("code_verifier"))?;

        let redirect_uri = self.shop.oauth_redirect_uri();
        let response = self.exchange_code(code, &redirect_uri, client_id, &verifier).await?;
        let token = AccessToken::issue(response, self.clock.now(), None)
            .ok_or_else(|| AuthError::AuthExchangeFailed("unusable token response".into()))?;
        self.tokens.save(&token).await?;

        let pushed = self
            .api
            .update_module_configuration(&token.access_token, &self.configuration_payload())
            .await;
        match pushed {
            Ok(true) => {
                info!("oauth.shop_linked");
                Ok(token)
            }
            Ok(false) => {
                warn!("dashboard rejected the shop configuration");
                self.remove_configuration().await?;
                Err(AuthError::ShopConfigurationFailed.into())
            }
            Err(err) => {
                warn!(error_kind = err.label(), error = %err, "shop configuration push failed");
                self.remove_configuration().await?;
                Err(AuthError::ShopConfigurationFailed.into())
            }
        }
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse> {
        Ok(self.oauth.exchange_code(code, redirect_uri, client_id, code_verifier).await?)
    }

    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse> {
        Ok(self.oauth.refresh(refresh_token, client_id, code_verifier).await?)
    }

    /// Shop URL and logo must both be set before linking.
    pub fn check_requirements(&self) -> Result<()> {
        let has_logo = self.shop.logo_url.as_deref().is_some_and(|logo| !logo.is_empty());
        if self.shop.url.is_empty() || !has_logo {
            return Err(AuthError::RequirementsNotMet.into());
        }
        Ok(())
    }

    /// What the settings page should render.
    #[instrument(skip(self))]
    pub async fn account_status(&self) -> Result<AccountStatus> {
        if let Some(token) = self.tokens.access_token().await? {
            let shop = self.api.shop(&token).await.unwrap_or_else(|err| {
                warn!(error_kind = err.label(), error = %err, "failed to fetch shop profile");
                None
            });
            return Ok(AccountStatus::Linked { shop });
        }

        let session = match self.session().await? {
            Some(session) => session,
            None => self.prepare_session().await?.ok_or(AuthError::MissingSession("state"))?,
        };
        let authorization_url = self.authorization_url(&session)?;

        let onboarding = self
            .api
            .onboarding(&self.shop.cms_version, &self.shop.locale)
            .await
            .unwrap_or_else(|err| {
                warn!(error_kind = err.label(), error = %err, "failed to fetch onboarding");
                None
            });

        Ok(AccountStatus::NotLinked { onboarding, authorization_url })
    }

    /// Revoke the integration remotely, then forget every OAuth option.
    ///
    /// Returns whether the dashboard accepted the revoke. Local options are
    /// kept when it did not.
    #[instrument(skip(self))]
    pub async fn revoke(&self) -> Result<bool> {
        let Some(token) = self.tokens.access_token().await? else {
            return Ok(false);
        };

        let revoked = self.api.revoke(&token).await?;
        if revoked {
            self.remove_configuration().await?;
            info!("oauth.shop_unlinked");
        }
        Ok(revoked)
    }

    /// Delete state, verifier, client id, code and token.
    pub async fn remove_configuration(&self) -> Result<()> {
        for key in OAUTH_OPTION_KEYS {
            self.config.delete(key).await?;
        }
        Ok(())
    }

    /// Dashboard link shown once linked.
    pub async fn dashboard_url(&self) -> Result<Option<String>> {
        Ok(self.tokens.is_authenticated().await?.then(|| self.api_base_url.clone()))
    }

    pub fn configuration_payload(&self) -> ConfigurationPayload {
        ConfigurationPayload {
            configuration: ShopConfiguration {
                name: self.shop.name.clone(),
                cms_name: PLATFORM_NAME.to_string(),
                cms_version: self.shop.cms_version.clone(),
                website_url: self.shop.url.clone(),
                logo_url: self.shop.logo_url.clone().unwrap_or_default(),
            },
        }
    }
}
