// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local HTTP listener that completes the browser half of the OAuth login.

pub mod http;
pub mod listen;

use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::text_response;
use crate::state::BridgeState;

/// Page served at `/`; `{{LOGIN_URL}}` is replaced with the authorize URL.
pub const REDIRECT_HTML: &str = include_str!("../web/redirect.html");

/// Page served after a successful code exchange.
pub const SUCCESS_HTML: &str = include_str!("../web/success.html");

/// Build the callback router. Unknown paths and methods answer 404.
pub fn build_router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/", get(http::login_page).fallback(http::not_found))
        .route("/oauth/callback", get(http::oauth_callback).fallback(http::not_found))
        .fallback(http::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "callback handler panicked");
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
