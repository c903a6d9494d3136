// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{build_http_client, RevClient};
use crate::config::BridgeConfig;
use crate::credential::api_key::ApiKeyAuthenticator;
use crate::credential::oauth::OAuthAuthenticator;
use crate::credential::CredentialStore;

/// Progress of the interactive login, as seen by the callback server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum LoginPhase {
    Idle,
    ChallengeIssued,
    CodeReceived,
    TokenExchanged { success: bool },
}

/// Shared bridge state, owned by `run` and handed to every component.
pub struct BridgeState {
    pub config: BridgeConfig,
    pub store: Arc<CredentialStore>,
    pub client: RevClient,
    pub oauth: Arc<OAuthAuthenticator>,
    pub api_key: Arc<ApiKeyAuthenticator>,
    /// Port the callback server actually bound, if it is running.
    pub callback_port: Option<u16>,
    pub shutdown: CancellationToken,
    login: RwLock<LoginPhase>,
}

impl BridgeState {
    pub fn new(
        config: BridgeConfig,
        callback_port: Option<u16>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let http = build_http_client(&config.user_agent)?;
        let store = CredentialStore::new();
        let redirect_uri =
            BridgeConfig::redirect_uri(callback_port.unwrap_or(config.oauth_port));

        let oauth = OAuthAuthenticator::new(
            http.clone(),
            Arc::clone(&store),
            config.token_url(),
            config.oauth_client_id.clone(),
            redirect_uri,
        );
        let api_key = ApiKeyAuthenticator::new(
            http.clone(),
            Arc::clone(&store),
            config.authenticate_url(),
            config.api_key().map(str::to_owned),
            config.secret.clone(),
        );
        let client = RevClient::new(http, Arc::clone(&store));

        Ok(Self {
            config,
            store,
            client,
            oauth,
            api_key,
            callback_port,
            shutdown,
            login: RwLock::new(LoginPhase::Idle),
        })
    }

    pub fn login_phase(&self) -> LoginPhase {
        *self.login.read()
    }

    pub fn set_login_phase(&self, phase: LoginPhase) {
        let mut current = self.login.write();
        if *current != phase {
            tracing::debug!(from = ?*current, to = ?phase, "login phase");
            *current = phase;
        }
    }

    /// URL of the local login page, when the callback server is up.
    pub fn login_page_url(&self) -> Option<String> {
        self.callback_port.map(|port| format!("http://localhost:{port}/"))
    }

    /// Stop scheduled renewals. Called once on shutdown.
    pub fn cancel_timers(&self) {
        self.oauth.timer().cancel();
        self.api_key.timer().cancel();
    }
}
