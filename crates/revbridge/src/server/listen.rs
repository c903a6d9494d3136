// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::ErrorKind;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::server::build_router;
use crate::state::BridgeState;

/// Bind `host:primary`, falling back to `host:backup` once if the primary
/// port is taken. Any other bind error is returned as-is.
pub async fn bind_with_fallback(host: &str, primary: u16, backup: u16) -> anyhow::Result<TcpListener> {
    match TcpListener::bind((host, primary)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            tracing::warn!(port = primary, backup, "callback port in use, trying backup port");
            match TcpListener::bind((host, backup)).await {
                Ok(listener) => Ok(listener),
                Err(e) if e.kind() == ErrorKind::AddrInUse => Err(anyhow::anyhow!(
                    "both primary port {primary} and backup port {backup} are in use"
                )),
                Err(e) => Err(e).with_context(|| format!("failed to bind {host}:{backup}")),
            }
        }
        Err(e) => Err(e).with_context(|| format!("failed to bind {host}:{primary}")),
    }
}

/// Serve the callback router until `shutdown` fires.
pub fn spawn_callback_server(
    listener: TcpListener,
    state: Arc<BridgeState>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();
    let router = build_router(state);
    tokio::spawn(async move {
        tracing::info!(port, "oauth callback server listening");
        let result = axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await;
        match result {
            Ok(()) => tracing::info!("oauth callback server stopped"),
            Err(e) => tracing::error!(err = %e, "oauth callback server error"),
        }
    })
}

#[cfg(test)]
#[path = "listen_tests.rs"]
mod tests;
