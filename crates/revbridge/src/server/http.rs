// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the login page and the OAuth redirect target.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::credential::exchange::ExchangeError;
use crate::credential::pkce::{build_auth_url, PkcePair};
use crate::error::{text_response, BridgeError};
use crate::server::{REDIRECT_HTML, SUCCESS_HTML};
use crate::state::{BridgeState, LoginPhase};

/// Cookie carrying the PKCE verifier between `/` and the callback.
pub const VERIFIER_COOKIE: &str = "code_verifier";

/// `GET /`: issue a PKCE challenge and bounce the browser to the tenant.
pub async fn login_page(State(s): State<Arc<BridgeState>>) -> Response {
    if !s.config.oauth_enabled {
        return not_found().await;
    }

    let pkce = PkcePair::generate();
    let login_url = build_auth_url(
        &s.config.authorize_url(),
        s.oauth.client_id(),
        s.oauth.redirect_uri(),
        &s.config.oauth_scopes,
        &pkce.challenge,
    );
    s.set_login_phase(LoginPhase::ChallengeIssued);
    tracing::info!("login page served, redirecting to tenant");

    let cookie = format!("{VERIFIER_COOKIE}={}; Path=/; HttpOnly", pkce.verifier);
    let html = REDIRECT_HTML.replace("{{LOGIN_URL}}", &login_url);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => ([(header::SET_COOKIE, value)], Html(html)).into_response(),
        Err(e) => {
            tracing::error!(err = %e, "verifier cookie is not a valid header value");
            BridgeError::Internal.to_http_response("Internal server error.")
        }
    }
}

/// `GET /oauth/callback?code=...`: trade the code for tokens.
pub async fn oauth_callback(
    State(s): State<Arc<BridgeState>>,
    headers: HeaderMap,
    query: Result<Query<HashMap<String, String>>, axum::extract::rejection::QueryRejection>,
) -> Response {
    tracing::info!("oauth callback received");

    let code = query
        .ok()
        .and_then(|Query(mut params)| params.remove("code"))
        .map(|c| normalize_code(&c))
        .unwrap_or_default();
    if code.is_empty() {
        return BridgeError::BadRequest.to_http_response("Missing code parameter.");
    }

    let Some(verifier) = verifier_from_cookies(&headers) else {
        tracing::warn!("callback without code_verifier cookie");
        return BridgeError::BadRequest.to_http_response("Missing code_verifier cookie.");
    };

    s.set_login_phase(LoginPhase::CodeReceived);
    let result = s.oauth.exchange_code(&code, &verifier).await;
    s.set_login_phase(LoginPhase::TokenExchanged { success: result.is_ok() });

    match result {
        Ok(_) => {
            let clear = format!("{VERIFIER_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
            let mut resp = Html(SUCCESS_HTML).into_response();
            if let Ok(value) = HeaderValue::from_str(&clear) {
                resp.headers_mut().insert(header::SET_COOKIE, value);
            }
            resp
        }
        Err(ExchangeError::Rejected { status, body }) => {
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            text_response(status, format!("Token exchange failed: {body}"))
        }
        Err(ExchangeError::Malformed(_)) => {
            BridgeError::Internal.to_http_response("Failed to parse token response.")
        }
        Err(ExchangeError::Transport(e)) => {
            BridgeError::Internal.to_http_response(format!("Token request error: {e}"))
        }
    }
}

pub async fn not_found() -> Response {
    BridgeError::NotFound.to_http_response("Not found.")
}

/// Query decoding turns `+` into a space; authorization codes use `+`
/// literally, so put it back.
pub fn normalize_code(raw: &str) -> String {
    raw.replace(' ', "+")
}

/// Find the verifier across all `Cookie` headers.
pub fn verifier_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(VERIFIER_COOKIE)?.strip_prefix('='))
        .find(|value| !value.is_empty())
        .map(str::to_owned)
}
