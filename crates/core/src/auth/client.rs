//! OAuth 2.0 token endpoint client
//!
//! Handles the two token calls of the PKCE flow:
//! - Authorization code exchange
//! - Token refresh
//!
//! Token calls never carry a bearer header. A usable reply is a JSON object
//! with both `token_type` and `access_token`; anything else fails.

use std::sync::Arc;

use recreviews_domain::constants::PATH_OAUTH_TOKEN;
use recreviews_domain::{ApiError, AuthError, TokenResponse};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::api::{ApiRequest, ApiResponse, ApiTransport};

#[derive(Clone)]
pub struct OAuthClient {
    transport: Arc<dyn ApiTransport>,
}

impl OAuthClient {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// `AuthExchangeFailed` on transport failure, forbidden, or a response
    /// missing `token_type`/`access_token`.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        let form = json!({
            "grant_type": "authorization_code",
            "client_id": client_id,
            "code_verifier": code_verifier,
            "redirect_uri": redirect_uri,
            "code": code,
        });

        self.token_call(form).await.map_err(AuthError::AuthExchangeFailed)
    }

    /// Obtain a fresh token from a refresh token.
    ///
    /// # Errors
    /// `TokenRefreshFailed` under the same conditions as
    /// [`OAuthClient::exchange_code`].
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        let form = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
            "client_id": client_id,
            "code_verifier": code_verifier,
        });

        self.token_call(form).await.map_err(AuthError::TokenRefreshFailed)
    }

    async fn token_call(&self, form: Value) -> Result<TokenResponse, String> {
        let request = ApiRequest::post(PATH_OAUTH_TOKEN).params(form);

        let body = match self.transport.request(request).await {
            Ok(ApiResponse::Json(body)) => body,
            Ok(ApiResponse::Forbidden) => return Err("token endpoint returned forbidden".into()),
            Err(err) => return Err(describe_transport_error(&err)),
        };

        if !body.is_object() {
            warn!("token endpoint returned an empty or non-object body");
            return Err("empty token response".into());
        }

        let response: TokenResponse = serde_json::from_value(body)
            .map_err(|err| format!("malformed token response: {err}"))?;

        if !response.is_complete() {
            warn!("token endpoint response missing token_type or access_token");
            return Err("token response missing token_type or access_token".into());
        }

        debug!(expires_in = response.expires_in, "token endpoint returned a token");
        Ok(response)
    }
}

fn describe_transport_error(err: &ApiError) -> String {
    format!("{} (code {})", err, err.code())
}
