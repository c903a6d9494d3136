// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Error codes for the local callback server.
///
/// Responses are plain text: the only client is a browser following the
/// identity provider's redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    BadRequest,
    NotFound,
    Internal,
}

impl BridgeError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        text_response(status, message)
    }
}

/// Build a `text/plain` response with an arbitrary status.
pub fn text_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], message.into()).into_response()
}
