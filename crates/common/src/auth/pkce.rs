//! PKCE (Proof Key for Code Exchange) helpers for OAuth 2.0
//!
//! Implements the verifier format expected by the Rec.Reviews authorization
//! server: a running-sum walk over a fixed alphabet driven by random bytes,
//! and an RFC 7636 `S256` challenge.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Characters a verifier or state token may contain (no lowercase `l`).
pub const VERIFIER_ALPHABET: &[u8] =
    b"abcdefghijkmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ.-_~";

/// Default verifier length.
pub const DEFAULT_VERIFIER_LENGTH: usize = 128;

/// Default CSRF state length.
pub const DEFAULT_STATE_LENGTH: usize = 40;

/// Challenge method sent with the authorization request.
pub const CHALLENGE_METHOD: &str = "S256";

/// Map random bytes onto the verifier alphabet.
///
/// Each byte moves a cursor forward (`position = (position + byte) % len`)
/// and the character under the cursor is appended, so the output depends on
/// every preceding byte.
///
/// # Examples
/// ```
/// use recreviews_common::auth::pkce::code_verifier_from_bytes;
///
/// assert_eq!(code_verifier_from_bytes(&[0, 1, 1]), "abc");
/// ```
pub fn code_verifier_from_bytes(bytes: &[u8]) -> String {
    let len = VERIFIER_ALPHABET.len();
    let mut position = 0usize;

    bytes
        .iter()
        .map(|byte| {
            position = (position + usize::from(*byte)) % len;
            char::from(VERIFIER_ALPHABET[position])
        })
        .collect()
}

/// Generate a verifier of `length` characters from OS randomness.
pub fn generate_code_verifier(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    code_verifier_from_bytes(&bytes)
}

/// Generate the CSRF state token sent with the authorization request.
pub fn generate_state() -> String {
    generate_code_verifier(DEFAULT_STATE_LENGTH)
}

/// Derive the code challenge: `BASE64URL(SHA256(verifier))` without padding.
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Compare the state stored before the redirect with the one received.
///
/// An empty stored state never validates. Equal-length inputs are compared
/// in constant time.
pub fn validate_state(expected: &str, actual: &str) -> bool {
    let (expected, actual) = (expected.as_bytes(), actual.as_bytes());
    if expected.is_empty() || expected.len() != actual.len() {
        return false;
    }
    expected.iter().zip(actual).fold(0u8, |diff, (a, b)| diff | (a ^ b)) == 0
}
