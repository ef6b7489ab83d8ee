//! OAuth helpers shared by the authorization flow and token refresh

pub mod pkce;

pub use pkce::{
    code_challenge, code_verifier_from_bytes, generate_code_verifier, generate_state,
    validate_state, CHALLENGE_METHOD,
};
