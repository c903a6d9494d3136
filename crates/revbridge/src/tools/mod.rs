// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query tools exposed to the agent.
//!
//! The set is static: five read-only Rev queries, plus `vbrick_authorize`
//! when interactive login is enabled.

pub mod authorize;
pub mod video;

use std::fmt;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::BridgeState;

/// Every tool the bridge knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    WhoAmI,
    SearchVideos,
    VideoDetails,
    VideoChapters,
    VideoTranscripts,
    Authorize,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        Self::WhoAmI,
        Self::SearchVideos,
        Self::VideoDetails,
        Self::VideoChapters,
        Self::VideoTranscripts,
        Self::Authorize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::WhoAmI => "vbrick_who_am_i",
            Self::SearchVideos => "vbrick_search_videos",
            Self::VideoDetails => "vbrick_get_video_details",
            Self::VideoChapters => "vbrick_get_video_chapters",
            Self::VideoTranscripts => "vbrick_get_video_transcripts",
            Self::Authorize => "vbrick_authorize",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::WhoAmI => {
                "Check who is the current logged-in Vbrick Rev user. \
                 Always use this tool first to check if the user is authenticated and get users info."
            }
            Self::SearchVideos => {
                "Search for videos within Vbrick Rev. \
                 The search works with a keyword and returns results in order by best match. \
                 Make sure the user is authenticated or there may not be any results."
            }
            Self::VideoDetails => {
                "Get details for a specific video within Vbrick Rev. \
                 The results include information about the video including the playback link."
            }
            Self::VideoChapters => "Get chapters for a specific video within Vbrick Rev",
            Self::VideoTranscripts => {
                "Get transcripts for a specific video within Vbrick Rev. \
                 The transcript is returned in SRT format with timestamps. \
                 Return just the text to the user unless more information is requested."
            }
            Self::Authorize => {
                "This tool will let the user get logged in. \
                 You will not get a confirmation until the user logs in, so wait for that."
            }
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let video_id = json!({
            "type": "object",
            "properties": {
                "videoId": { "type": "string", "description": "ID of the video to retrieve" }
            },
            "required": ["videoId"]
        });
        match self {
            Self::WhoAmI | Self::Authorize => json!({ "type": "object", "properties": {} }),
            Self::SearchVideos => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search terms, title, description, tags"
                    },
                    "count": {
                        "type": "number",
                        "minimum": video::MIN_SEARCH_COUNT,
                        "maximum": video::MAX_SEARCH_COUNT,
                        "default": video::DEFAULT_SEARCH_COUNT,
                        "description": "Number of results to return, the default is 10."
                    }
                },
                "required": ["query"]
            }),
            Self::VideoDetails | Self::VideoChapters | Self::VideoTranscripts => video_id,
        }
    }

    /// Entry in a `tools/list` result.
    pub fn definition(&self) -> Tool {
        let schema: JsonObject = match self.input_schema() {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        Tool::new(self.name(), self.description(), Arc::new(schema))
    }
}

/// Text content returned to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Pretty-printed JSON payload.
    pub fn json(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self { text }
    }

    pub fn into_result(self) -> CallToolResult {
        CallToolResult::success(vec![Content::text(self.text)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    UnknownTool(String),
    InvalidArguments(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

/// Deserialize tool arguments, treating a missing object as `{}`.
pub fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The tools registered for this process.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    pub fn new(oauth_enabled: bool) -> Self {
        let tools = ToolKind::ALL
            .into_iter()
            .filter(|kind| oauth_enabled || *kind != ToolKind::Authorize)
            .collect();
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolKind::definition).collect()
    }

    pub fn find(&self, name: &str) -> Option<ToolKind> {
        self.tools.iter().copied().find(|kind| kind.name() == name)
    }

    /// Run a tool. Rev failures come back as text output, not errors.
    pub async fn call(
        &self,
        state: &BridgeState,
        name: &str,
        args: Value,
    ) -> Result<ToolOutput, ToolError> {
        let kind = self.find(name).ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        tracing::debug!(tool = name, "tool call");
        match kind {
            ToolKind::WhoAmI => Ok(video::who_am_i(state).await),
            ToolKind::SearchVideos => video::search_videos(state, parse_args(args)?).await,
            ToolKind::VideoDetails => Ok(video::video_details(state, parse_args(args)?).await),
            ToolKind::VideoChapters => Ok(video::video_chapters(state, parse_args(args)?).await),
            ToolKind::VideoTranscripts => {
                Ok(video::video_transcripts(state, parse_args(args)?).await)
            }
            ToolKind::Authorize => Ok(authorize::authorize(state).await),
        }
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
