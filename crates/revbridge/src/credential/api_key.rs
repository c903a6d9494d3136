// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static API key + secret exchange with self-scheduled renewal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::credential::timer::{api_key_renew_delay, RefreshTimer};
use crate::credential::{Credential, CredentialSource, CredentialStore};

/// Lifetime assumed when the tenant omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Response body of `POST /api/v2/authenticate`.
#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, deserialize_with = "crate::credential::lifetime_secs")]
    expires_in: Option<u64>,
}

pub struct ApiKeyAuthenticator {
    http: reqwest::Client,
    store: Arc<CredentialStore>,
    authenticate_url: String,
    api_key: Option<String>,
    secret: String,
    timer: RefreshTimer,
}

impl ApiKeyAuthenticator {
    /// `api_key` of `None` or `""` disables this authenticator.
    pub fn new(
        http: reqwest::Client,
        store: Arc<CredentialStore>,
        authenticate_url: String,
        api_key: Option<String>,
        secret: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            http,
            store,
            authenticate_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            secret,
            timer: RefreshTimer::new("api_key"),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    /// Exchange the key for a token and arm renewal.
    ///
    /// Returns `None` without network I/O when no key is configured, and
    /// `None` (with nothing scheduled) when the exchange fails.
    pub async fn authenticate(self: &Arc<Self>) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no api key configured, skipping key authentication");
            return None;
        };

        match self.request(api_key).await {
            Ok((token, expires_in)) => {
                self.store
                    .set(Credential::new(token.clone(), CredentialSource::ApiKey, Some(expires_in)))
                    .await;
                let delay = self.schedule_renewal(expires_in);
                tracing::info!(
                    expires_in,
                    renew_in_secs = delay.as_secs(),
                    "authenticated with api key"
                );
                Some(token)
            }
            Err(e) => {
                tracing::warn!(err = %format!("{e:#}"), "api key authentication failed");
                None
            }
        }
    }

    async fn request(&self, api_key: &str) -> anyhow::Result<(String, u64)> {
        let body = serde_json::json!({ "apiKey": api_key, "secret": self.secret });
        let resp = self
            .http
            .post(&self.authenticate_url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body.to_string())
            .send()
            .await
            .context("authenticate request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("authenticate failed ({status}): {text}");
        }

        let parsed: AuthenticateResponse =
            resp.json().await.context("invalid authenticate response")?;
        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("authenticate response has no token"))?;
        let expires_in = parsed.expires_in.filter(|&e| e > 0).unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Ok((token, expires_in))
    }

    fn schedule_renewal(self: &Arc<Self>, expires_in: u64) -> Duration {
        let delay = api_key_renew_delay(expires_in);
        let this = Arc::clone(self);
        self.timer.schedule(delay, async move {
            match this.authenticate().await {
                Some(_) => tracing::info!("api key token renewed"),
                None => tracing::warn!("api key token renewal failed"),
            }
        });
        delay
    }
}

#[cfg(test)]
#[path = "api_key_tests.rs"]
mod tests;
