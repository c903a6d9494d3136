// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth authorization code + PKCE (RFC 7636) helpers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::client::encode_component;

/// Random bytes behind each verifier (64 base64url chars).
const VERIFIER_BYTES: usize = 48;

/// A verifier and its S256 challenge, generated per login attempt.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        Self { verifier, challenge }
    }
}

/// Generate a PKCE code verifier (URL-safe, fresh randomness on every call).
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute code_challenge = base64url_nopad(sha256(verifier)).
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the tenant authorization URL for an S256 challenge.
///
/// `scope` is omitted from the query when empty.
pub fn build_auth_url(
    authorize_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    code_challenge: &str,
) -> String {
    let mut url = format!(
        "{authorize_url}?response_type=code\
         &client_id={client_id}\
         &redirect_uri={redirect_uri}\
         &code_challenge={code_challenge}\
         &code_challenge_method=S256",
        client_id = encode_component(client_id),
        redirect_uri = encode_component(redirect_uri),
        code_challenge = encode_component(code_challenge),
    );
    let scope = scope.trim();
    if !scope.is_empty() {
        url.push_str("&scope=");
        url.push_str(&encode_component(scope));
    }
    url
}

#[cfg(test)]
#[path = "pkce_tests.rs"]
mod tests;
