//! Transient OAuth session held between authorization and code exchange

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthSession {
    /// CSRF nonce echoed back by the authorization redirect
    pub state: String,
    /// PKCE secret, sent only during token calls
    pub code_verifier: String,
    pub client_id: Option<String>,
    pub authorization_code: Option<String>,
}

impl OAuthSession {
    pub fn new(state: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            code_verifier: code_verifier.into(),
            client_id: None,
            authorization_code: None,
        }
    }
}
