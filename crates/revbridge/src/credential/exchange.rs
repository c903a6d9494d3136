// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoint requests shared by the initial code exchange and refresh.

use std::fmt;

use reqwest::StatusCode;

use crate::credential::oauth::TokenResponse;

/// The grant presented to the token endpoint.
#[derive(Debug, Clone, Copy)]
pub enum TokenGrant<'a> {
    AuthorizationCode {
        code: &'a str,
        code_verifier: &'a str,
    },
    /// The tenant expects the original code and verifier alongside the
    /// refresh token.
    RefreshToken {
        refresh_token: &'a str,
        code: &'a str,
        code_verifier: &'a str,
    },
}

impl TokenGrant<'_> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    /// JSON body for the token request.
    pub fn body(&self, client_id: &str, redirect_uri: &str) -> serde_json::Value {
        match *self {
            Self::AuthorizationCode { code, code_verifier } => serde_json::json!({
                "grant_type": self.grant_type(),
                "code": code,
                "code_verifier": code_verifier,
                "client_id": client_id,
                "redirect_uri": redirect_uri,
            }),
            Self::RefreshToken { refresh_token, code, code_verifier } => serde_json::json!({
                "grant_type": self.grant_type(),
                "code": code,
                "client_id": client_id,
                "redirect_uri": redirect_uri,
                "refresh_token": refresh_token,
                "code_verifier": code_verifier,
            }),
        }
    }
}

/// Why a token request produced no usable token.
#[derive(Debug)]
pub enum ExchangeError {
    /// The endpoint answered with something other than 200.
    Rejected { status: StatusCode, body: String },
    /// 200, but the body is not a token response.
    Malformed(String),
    /// The request never completed.
    Transport(reqwest::Error),
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, body } => write!(f, "token endpoint returned {status}: {body}"),
            Self::Malformed(msg) => write!(f, "malformed token response: {msg}"),
            Self::Transport(e) => write!(f, "token request failed: {e}"),
        }
    }
}

impl std::error::Error for ExchangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// POST a grant to the token endpoint. No retries.
pub async fn request_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    redirect_uri: &str,
    grant: TokenGrant<'_>,
) -> Result<TokenResponse, ExchangeError> {
    let resp = client
        .post(token_url)
        .header("Content-Type", "application/json")
        .body(grant.body(client_id, redirect_uri).to_string())
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    if status != StatusCode::OK {
        return Err(ExchangeError::Rejected { status, body: text });
    }

    let token: TokenResponse =
        serde_json::from_str(&text).map_err(|e| ExchangeError::Malformed(e.to_string()))?;
    if token.access_token.is_empty() {
        return Err(ExchangeError::Malformed("empty access_token".to_owned()));
    }
    Ok(token)
}

#[cfg(test)]
#[path = "exchange_tests.rs"]
mod tests;
