// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake Rev tenant for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use revbridge::config::BridgeConfig;

/// How the fake token endpoint answers.
#[derive(Debug, Clone)]
pub enum TokenReply {
    Ok(serde_json::Value),
    Status(u16, &'static str),
}

#[derive(Default)]
pub struct TenantCounters {
    pub token_calls: AtomicU32,
    pub authenticate_calls: AtomicU32,
    pub api_calls: AtomicU32,
    pub token_bodies: Mutex<Vec<serde_json::Value>>,
    pub auth_headers: Mutex<Vec<String>>,
}

struct Tenant {
    token: TokenReply,
    counters: Arc<TenantCounters>,
}

pub struct FakeTenant {
    pub addr: SocketAddr,
    pub counters: Arc<TenantCounters>,
}

impl FakeTenant {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_calls(&self) -> u32 {
        self.counters.token_calls.load(Ordering::SeqCst)
    }

    pub fn authenticate_calls(&self) -> u32 {
        self.counters.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> u32 {
        self.counters.api_calls.load(Ordering::SeqCst)
    }

    pub fn last_token_body(&self) -> Option<serde_json::Value> {
        self.counters.token_bodies.lock().last().cloned()
    }
}

async fn token(
    State(t): State<Arc<Tenant>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    t.counters.token_calls.fetch_add(1, Ordering::SeqCst);
    t.counters.token_bodies.lock().push(body);
    match &t.token {
        TokenReply::Ok(v) => (StatusCode::OK, v.to_string()),
        TokenReply::Status(code, text) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            (*text).to_owned(),
        ),
    }
}

async fn authenticate(State(t): State<Arc<Tenant>>) -> Json<serde_json::Value> {
    t.counters.authenticate_calls.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({ "token": "key-token", "expires_in": 3600 }))
}

async fn users_me(
    State(t): State<Arc<Tenant>>,
    headers: axum::http::HeaderMap,
) -> Json<serde_json::Value> {
    t.counters.api_calls.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    t.counters.auth_headers.lock().push(auth);
    Json(serde_json::json!({
        "firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com",
        "username": "ada", "roles": ["admin"]
    }))
}

pub async fn spawn_tenant(token_reply: TokenReply) -> anyhow::Result<FakeTenant> {
    let counters = Arc::new(TenantCounters::default());
    let tenant = Arc::new(Tenant { token: token_reply, counters: Arc::clone(&counters) });
    let app = Router::new()
        .route("/api/v2/oauth2/token", post(token))
        .route("/api/v2/authenticate", post(authenticate))
        .route("/api/v2/users/me", get(users_me))
        .with_state(tenant);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(FakeTenant { addr, counters })
}

pub fn config(tenant: &str, extra: &[&str]) -> anyhow::Result<BridgeConfig> {
    let mut args = vec!["revbridge", "--tenant-url", tenant, "--no-browser"];
    args.extend_from_slice(extra);
    Ok(BridgeConfig::try_parse_from(args)?)
}
