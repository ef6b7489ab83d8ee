//! OAuth 2.0 + PKCE shop linking and token lifecycle

pub mod client;
pub mod oauth_flow;
pub mod token_store;

pub use client::OAuthClient;
pub use oauth_flow::{AuthorizationRedirect, OAuthFlow};
pub use token_store::TokenStore;
