// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP server on stdin/stdout, exposing the [`ToolRegistry`].
//!
//! Framing, `initialize` negotiation and request dispatch are rmcp's. Each
//! request is handled on its own task, so a long `vbrick_authorize` wait does
//! not hold up other calls.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::state::BridgeState;
use crate::tools::{ToolError, ToolRegistry};

pub const SERVER_NAME: &str = "rev-mcp-server";

impl From<ToolError> for ErrorData {
    fn from(e: ToolError) -> Self {
        ErrorData::invalid_params(e.to_string(), None)
    }
}

/// MCP endpoint bound to one bridge.
pub struct McpServer {
    state: Arc<BridgeState>,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(state: Arc<BridgeState>) -> Self {
        let tools = ToolRegistry::new(state.config.oauth_enabled);
        Self { state, tools }
    }

    /// Serve one session over `reader`/`writer` until the peer closes it or
    /// `shutdown` fires.
    pub async fn serve_io<R, W>(
        self,
        reader: R,
        writer: W,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let service = self
            .serve_with_ct((reader, writer), shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("mcp initialize failed: {e}"))?;
        if let Some(peer) = service.peer_info() {
            tracing::info!(
                client = %peer.client_info.name,
                protocol = ?peer.protocol_version,
                "mcp client connected"
            );
        }
        let reason = service.waiting().await?;
        tracing::info!(?reason, "mcp session ended");
        Ok(())
    }

    pub async fn serve_stdio(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        tracing::info!("mcp server running on stdio");
        self.serve_io(tokio::io::stdin(), tokio::io::stdout(), shutdown).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.to_owned();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_owned();
        info
    }

    #[allow(clippy::manual_async_fn)]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        async move { Ok(ListToolsResult::with_all_items(self.tools.definitions())) }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
            let output = self.tools.call(&self.state, &request.name, args).await?;
            Ok(output.into_result())
        }
    }
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
