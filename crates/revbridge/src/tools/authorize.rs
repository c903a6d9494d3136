// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::time::Instant;

use crate::credential::oauth::OAuthAuthenticator;
use crate::credential::CredentialStore;
use crate::state::BridgeState;
use crate::tools::ToolOutput;

pub const LOGIN_SUCCESS: &str = "✅ Login successful!";
pub const LOGIN_PENDING: &str = "⏳ The login process is still pending. Use the who-am-i tool to keep \
     checking if the login succeeded, or run the authorize tool again.";

/// Open the local login page and wait (bounded) for the OAuth credential.
pub async fn authorize(state: &BridgeState) -> ToolOutput {
    let url = state
        .login_page_url()
        .unwrap_or_else(|| format!("http://localhost:{}/", state.config.oauth_port));

    if state.config.no_browser {
        tracing::info!(url, "open this URL to log in");
    } else {
        open_browser(url).await;
    }

    let poll = state.config.login_poll_interval();
    let timeout = state.config.login_timeout();
    let logged_in = tokio::select! {
        done = wait_for_login(&state.oauth, &state.store, poll, timeout) => done,
        _ = state.shutdown.cancelled() => state.oauth.has_token(),
    };
    if logged_in {
        ToolOutput::text(LOGIN_SUCCESS)
    } else {
        ToolOutput::text(LOGIN_PENDING)
    }
}

async fn open_browser(url: String) {
    tracing::info!(url, "opening browser for login");
    let result = tokio::task::spawn_blocking(move || webbrowser::open(&url)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(err = %e, "failed to open browser"),
        Err(e) => tracing::warn!(err = %e, "browser task failed"),
    }
}

/// Wait until `oauth` has obtained a token or `timeout` has elapsed.
/// Returns whether it did.
///
/// Checks every `poll`, and early whenever the store reports a new credential.
pub async fn wait_for_login(
    oauth: &OAuthAuthenticator,
    store: &CredentialStore,
    poll: Duration,
    timeout: Duration,
) -> bool {
    let poll = poll.max(Duration::from_millis(1));
    let mut events = store.subscribe();
    let start = Instant::now();
    loop {
        if oauth.has_token() {
            return true;
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return false;
        }
        tokio::select! {
            // Lagged or not, re-check the flag.
            _ = events.recv() => {}
            _ = tokio::time::sleep(poll.min(remaining)) => {}
        }
    }
}
