// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Revbridge: OAuth/API-key credential bridge between an MCP agent and a
//! Vbrick Rev tenant.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod mcp;
pub mod server;
pub mod state;
pub mod tools;

#[cfg(test)]
pub mod test_support;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::mcp::McpServer;
use crate::server::listen::{bind_with_fallback, spawn_callback_server};
use crate::state::BridgeState;

/// Run the bridge until stdin closes or a shutdown signal arrives.
pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let listener = if config.oauth_enabled {
        Some(bind_with_fallback(&config.host, config.oauth_port, config.oauth_backup_port).await?)
    } else {
        None
    };
    let callback_port = match &listener {
        Some(l) => Some(l.local_addr()?.port()),
        None => None,
    };

    tracing::info!(
        tenant = config.tenant(),
        oauth = config.oauth_enabled,
        api_key = config.api_key().is_some(),
        "starting revbridge"
    );
    let state = Arc::new(BridgeState::new(config, callback_port, shutdown.clone())?);

    let server_task = listener
        .map(|l| spawn_callback_server(l, Arc::clone(&state), shutdown.clone()));

    if state.api_key.authenticate().await.is_none() && state.api_key.is_configured() {
        tracing::warn!("continuing without an api key credential");
    }

    let mcp = McpServer::new(Arc::clone(&state));
    let result = mcp.serve_stdio(shutdown.clone()).await;

    shutdown.cancel();
    state.cancel_timers();
    if let Some(task) = server_task {
        let _ = task.await;
    }
    tracing::info!("revbridge stopped");
    result
}

/// Initialize tracing on stderr; stdout carries the MCP protocol.
///
/// Uses `try_init` so it's safe to call more than once.
pub fn init_tracing(config: &BridgeConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };
    drop(result);
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
}
