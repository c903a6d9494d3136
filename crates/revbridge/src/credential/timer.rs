// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable single-slot refresh scheduling.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// OAuth tokens are refreshed this long before they expire.
pub const OAUTH_REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// Lower bound for an OAuth refresh delay.
pub const OAUTH_MIN_DELAY: Duration = Duration::from_secs(1);

/// API-key tokens are renewed this long before they expire.
pub const API_KEY_RENEW_MARGIN: Duration = Duration::from_secs(60);

/// Lower bound for an API-key renewal delay.
pub const API_KEY_MIN_DELAY: Duration = Duration::from_secs(10);

/// Upper bound for any scheduled delay.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// `max(expires_in - 10s, 1s)`.
pub fn oauth_refresh_delay(expires_in_secs: u64) -> Duration {
    Duration::from_secs(expires_in_secs).saturating_sub(OAUTH_REFRESH_MARGIN).max(OAUTH_MIN_DELAY)
}

/// `max(expires_in - 60s, 10s)`.
pub fn api_key_renew_delay(expires_in_secs: u64) -> Duration {
    Duration::from_secs(expires_in_secs)
        .saturating_sub(API_KEY_RENEW_MARGIN)
        .max(API_KEY_MIN_DELAY)
}

struct Pending {
    id: u64,
    fire_at: Instant,
    cancel: CancellationToken,
}

/// A timer slot holding at most one pending task.
///
/// [`schedule`](Self::schedule) cancels whatever is pending before arming the
/// new task, so two scheduled refreshes can never both fire.
pub struct RefreshTimer {
    name: &'static str,
    slot: Arc<Mutex<Option<Pending>>>,
    next_id: AtomicU64,
}

impl RefreshTimer {
    pub fn new(name: &'static str) -> Self {
        Self { name, slot: Arc::new(Mutex::new(None)), next_id: AtomicU64::new(0) }
    }

    /// Run `task` after `delay`, replacing any pending task.
    ///
    /// Delays longer than [`MAX_DELAY`] are clamped to it.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let delay = delay.min(MAX_DELAY);
        let now = Instant::now();
        let fire_at = now.checked_add(delay).unwrap_or(now);
        {
            let mut slot = self.slot.lock();
            if let Some(prev) = slot.take() {
                prev.cancel.cancel();
            }
            *slot = Some(Pending { id, fire_at, cancel: cancel.clone() });
        }
        tracing::debug!(timer = self.name, delay_secs = delay.as_secs(), "refresh scheduled");

        let slot = Arc::clone(&self.slot);
        let name = self.name;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep_until(fire_at) => {}
            }
            // Vacate the slot before running: the task may re-arm this timer.
            {
                let mut slot = slot.lock();
                match slot.as_ref() {
                    Some(p) if p.id == id => *slot = None,
                    _ => return,
                }
            }
            tracing::debug!(timer = name, "refresh timer fired");
            task.await;
        });
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&self) {
        if let Some(prev) = self.slot.lock().take() {
            prev.cancel.cancel();
            tracing::debug!(timer = self.name, "refresh timer cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// When the pending task will fire.
    pub fn fire_at(&self) -> Option<Instant> {
        self.slot.lock().as_ref().map(|p| p.fire_at)
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
