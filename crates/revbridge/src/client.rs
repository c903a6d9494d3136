// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorized HTTP client for the Rev tenant API.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::credential::CredentialStore;

/// Authorization scheme the tenant expects in front of the token.
pub const AUTH_SCHEME: &str = "VBrick";

/// Response body left open for the caller to drain.
pub type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// Outcome of an API request, keyed on the response content type.
pub enum ApiResponse {
    Json(serde_json::Value),
    Stream(ByteStream),
    Text(String),
    /// No credential, transport failure or non-success status.
    None,
}

impl ApiResponse {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Collect the body as text. JSON is re-serialized.
    pub async fn into_text(self) -> Option<String> {
        match self {
            Self::Json(value) => Some(value.to_string()),
            Self::Text(text) => Some(text),
            Self::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(bytes) => buf.extend_from_slice(&bytes),
                        Err(e) => {
                            tracing::warn!(err = %e, "response stream failed");
                            return None;
                        }
                    }
                }
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            Self::None => None,
        }
    }

    /// Collect the body as a JSON value; non-JSON bodies become a string value.
    pub async fn into_value(self) -> Option<serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            other => other.into_text().await.map(serde_json::Value::String),
        }
    }
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// Build the shared outbound HTTP client.
pub fn build_http_client(user_agent: &str) -> anyhow::Result<reqwest::Client> {
    // Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

/// GETs tenant URLs with the current credential attached.
#[derive(Clone)]
pub struct RevClient {
    http: reqwest::Client,
    store: Arc<CredentialStore>,
}

impl RevClient {
    pub fn new(http: reqwest::Client, store: Arc<CredentialStore>) -> Self {
        Self { http, store }
    }

    /// Fetch `url`. Never errors: every failure is [`ApiResponse::None`].
    pub async fn request(&self, url: &str) -> ApiResponse {
        let Some(credential) = self.store.get().await else {
            tracing::warn!(url, "no access token available, skipping request");
            return ApiResponse::None;
        };
        if credential.is_expired() {
            tracing::warn!(url, source = %credential.source, "access token expired, skipping request");
            return ApiResponse::None;
        }
        let token = credential.token;

        tracing::debug!(url, "rev api request");
        let resp = match self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("{AUTH_SCHEME} {token}"))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(url, err = %e, "rev api request failed");
                return ApiResponse::None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url, %status, "rev api returned error status");
            return ApiResponse::None;
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains("application/json") {
            match resp.json().await {
                Ok(value) => ApiResponse::Json(value),
                Err(e) => {
                    tracing::warn!(url, err = %e, "invalid json from rev api");
                    ApiResponse::None
                }
            }
        } else if content_type.contains("application/octet-stream") || content_type.contains("stream")
        {
            ApiResponse::Stream(resp.bytes_stream().boxed())
        } else {
            match resp.text().await {
                Ok(text) => ApiResponse::Text(text),
                Err(e) => {
                    tracing::warn!(url, err = %e, "failed to read rev api response");
                    ApiResponse::None
                }
            }
        }
    }
}

/// Percent-encode a URL component (RFC 3986 unreserved characters pass through).
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
