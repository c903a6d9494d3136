// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth token lifecycle: code exchange, storage and scheduled refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credential::exchange::{request_token, ExchangeError, TokenGrant};
use crate::credential::timer::{oauth_refresh_delay, RefreshTimer};
use crate::credential::{Credential, CredentialSource, CredentialStore};

/// Standard OAuth2 token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::credential::lifetime_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,
}

/// Material needed to refresh without the browser.
#[derive(Clone)]
struct RefreshGrant {
    refresh_token: String,
    code: String,
    code_verifier: String,
}

/// Drives the token side of the authorization code flow.
pub struct OAuthAuthenticator {
    http: reqwest::Client,
    store: Arc<CredentialStore>,
    token_url: String,
    client_id: String,
    redirect_uri: String,
    timer: RefreshTimer,
    /// Set once any exchange or refresh has produced a token. The shared
    /// store may since hold an API-key token.
    logged_in: AtomicBool,
}

impl OAuthAuthenticator {
    pub fn new(
        http: reqwest::Client,
        store: Arc<CredentialStore>,
        token_url: String,
        client_id: String,
        redirect_uri: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            http,
            store,
            token_url,
            client_id,
            redirect_uri,
            timer: RefreshTimer::new("oauth"),
            logged_in: AtomicBool::new(false),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    /// Whether the interactive login has produced a token.
    pub fn has_token(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub(crate) fn record_login(&self) {
        self.logged_in.store(true, Ordering::SeqCst);
    }

    /// Exchange an authorization code for tokens.
    ///
    /// On success the access token is stored and a refresh is armed when the
    /// response allows one. On failure the store is left untouched.
    pub async fn exchange_code(
        self: &Arc<Self>,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, ExchangeError> {
        let grant = TokenGrant::AuthorizationCode { code, code_verifier };
        let token = match self.request(grant).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(err = %e, "authorization code exchange failed");
                return Err(e);
            }
        };
        self.apply(&token, code, code_verifier).await;
        tracing::info!(
            refresh_scheduled = self.timer.is_pending(),
            "oauth access token obtained"
        );
        Ok(token)
    }

    async fn refresh(self: &Arc<Self>, grant: RefreshGrant) {
        let request = TokenGrant::RefreshToken {
            refresh_token: &grant.refresh_token,
            code: &grant.code,
            code_verifier: &grant.code_verifier,
        };
        match self.request(request).await {
            Ok(token) => {
                self.apply(&token, &grant.code, &grant.code_verifier).await;
                tracing::info!("oauth token refreshed");
            }
            // Not retried: the credential stays as-is until it expires or a
            // new login happens.
            Err(e) => tracing::warn!(err = %e, "oauth token refresh failed"),
        }
    }

    async fn request(&self, grant: TokenGrant<'_>) -> Result<TokenResponse, ExchangeError> {
        request_token(&self.http, &self.token_url, &self.client_id, &self.redirect_uri, grant).await
    }

    async fn apply(self: &Arc<Self>, token: &TokenResponse, code: &str, code_verifier: &str) {
        // Before the store write, so a waiter woken by it sees the flag.
        self.record_login();
        self.store
            .set(Credential::new(token.access_token.clone(), CredentialSource::OAuth, token.expires_in))
            .await;
        self.schedule_refresh(token, code, code_verifier);
    }

    /// Arm the refresh timer from a token response.
    ///
    /// Requires both `refresh_token` and a non-zero `expires_in`; otherwise
    /// the credential is left to expire. Returns the delay that was armed.
    fn schedule_refresh(
        self: &Arc<Self>,
        token: &TokenResponse,
        code: &str,
        code_verifier: &str,
    ) -> Option<Duration> {
        let (Some(refresh_token), Some(expires_in)) = (&token.refresh_token, token.expires_in)
        else {
            return None;
        };
        if refresh_token.is_empty() || expires_in == 0 {
            return None;
        }

        let delay = oauth_refresh_delay(expires_in);
        let grant = RefreshGrant {
            refresh_token: refresh_token.clone(),
            code: code.to_owned(),
            code_verifier: code_verifier.to_owned(),
        };
        let this = Arc::clone(self);
        self.timer.schedule(delay, async move {
            this.refresh(grant).await;
        });
        Some(delay)
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
