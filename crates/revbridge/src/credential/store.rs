// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holder of the one live credential.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

/// Which authenticator produced a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    ApiKey,
    OAuth,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => f.write_str("api_key"),
            Self::OAuth => f.write_str("oauth"),
        }
    }
}

/// A bearer token plus where it came from.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
    pub expires_at: Option<Instant>,
}

impl Credential {
    /// A zero lifetime means the provider gave none. A lifetime past the
    /// clock's range never expires.
    pub fn new(token: String, source: CredentialSource, expires_in: Option<u64>) -> Self {
        let expires_at = expires_in
            .filter(|&secs| secs > 0)
            .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        Self { token, source, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

// Tokens never reach logs through `{:?}`.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Events broadcast when the stored credential changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialEvent {
    Stored { source: CredentialSource },
}

/// Process-wide credential slot. Last writer wins; no history is kept.
pub struct CredentialStore {
    current: RwLock<Option<Credential>>,
    event_tx: broadcast::Sender<CredentialEvent>,
}

impl CredentialStore {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(16);
        Arc::new(Self { current: RwLock::new(None), event_tx })
    }

    /// Replace the current credential and notify subscribers.
    pub async fn set(&self, credential: Credential) {
        let source = credential.source;
        *self.current.write().await = Some(credential);
        tracing::debug!(%source, "credential stored");
        // No subscribers is fine.
        let _ = self.event_tx.send(CredentialEvent::Stored { source });
    }

    pub async fn get(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    /// Notifications for every [`set`](Self::set).
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
