// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process HTTP fakes for the tenant API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use clap::Parser;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::state::BridgeState;

/// One scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self { status, content_type: "application/json", body: body.to_string() }
    }

    pub fn text(status: u16, content_type: &'static str, body: &str) -> Self {
        Self { status, content_type, body: body.to_owned() }
    }
}

/// A request the mock server received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Handle to a running mock server.
pub struct MockServer {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    /// JSON body of the most recent request.
    pub fn last_json(&self) -> Option<serde_json::Value> {
        let requests = self.requests.lock();
        requests.last().and_then(|r| serde_json::from_str(&r.body).ok())
    }
}

/// Spawn a server that answers every request with the next scripted
/// response, repeating the last one once the script runs out.
pub async fn mock_server(responses: Vec<MockResponse>) -> anyhow::Result<MockServer> {
    let calls = Arc::new(AtomicU32::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let responses = Arc::new(responses);

    let app = Router::new().fallback({
        let calls = Arc::clone(&calls);
        let requests = Arc::clone(&requests);
        move |uri: axum::http::Uri, headers: HeaderMap, body: String| {
            let calls = Arc::clone(&calls);
            let requests = Arc::clone(&requests);
            let responses = Arc::clone(&responses);
            async move {
                let idx = calls.fetch_add(1, Ordering::SeqCst) as usize;
                requests.lock().push(Recorded { path: uri.to_string(), headers, body });
                let resp = responses
                    .get(idx)
                    .or_else(|| responses.last())
                    .cloned()
                    .unwrap_or_else(|| MockResponse::text(500, "text/plain", "no script"));
                (
                    StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    [(header::CONTENT_TYPE, resp.content_type)],
                    resp.body,
                )
                    .into_response()
            }
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(MockServer { addr, calls, requests })
}

/// An address nothing listens on.
pub async fn dead_addr() -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Config pointing at `tenant`, with extra CLI flags.
pub fn test_config(tenant: &str, extra: &[&str]) -> anyhow::Result<BridgeConfig> {
    let mut args = vec!["revbridge", "--tenant-url", tenant, "--user-agent", "revbridge-test"];
    args.extend_from_slice(extra);
    Ok(BridgeConfig::try_parse_from(args)?)
}

/// State as `run` would build it with the callback server on port 8008.
pub fn test_state(config: BridgeConfig) -> anyhow::Result<Arc<BridgeState>> {
    Ok(Arc::new(BridgeState::new(config, Some(8008), CancellationToken::new())?))
}

/// Jump the tokio clock forward, then let it run in real time again.
///
/// Fires long timers in a test that still needs real socket I/O.
pub async fn skip_ahead(by: Duration) {
    tokio::time::pause();
    tokio::time::advance(by).await;
    tokio::time::resume();
}

/// Poll `done` in real time for up to five seconds.
pub async fn eventually(mut done: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}
