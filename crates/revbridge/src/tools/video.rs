// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::{encode_component, ApiResponse};
use crate::state::BridgeState;
use crate::tools::{ToolError, ToolOutput};

pub const DEFAULT_SEARCH_COUNT: u32 = 10;
pub const MIN_SEARCH_COUNT: u32 = 1;
pub const MAX_SEARCH_COUNT: u32 = 100;

/// Fields of `/users/me` returned to the agent.
const USER_FIELDS: &[&str] = &["firstname", "lastname", "email", "username"];

/// Fields of `/videos/{id}/details` returned to the agent.
const VIDEO_DETAIL_FIELDS: &[&str] = &[
    "id",
    "title",
    "htmlDescription",
    "description",
    "linkedUrl",
    "approvalStatus",
    "categories",
    "categoryPaths",
    "videoAccessControl",
    "accessControlEntities",
    "tags",
    "enableComments",
    "enableRatings",
    "enableDownloads",
    "enableExternalApplicationAccess",
    "enableExternalViewersAccess",
    "status",
    "canEdit",
    "thumbnailKey",
    "thumbnailUrl",
    "uploadedBy",
    "whenUploaded",
    "lastViewed",
    "customFields",
    "sourceType",
    "expirationDate",
    "expirationAction",
    "publishDate",
    "is360",
    "unlisted",
    "totalViews",
    "overallProgress",
    "isProcessing",
    "enableAutoShowChapterImages",
    "sensitiveContent",
    "passwordIsRequired",
    "password",
    "userTags",
    "upLoader",
    "owner",
    "instances",
    "audioTracks",
    "duration",
    "chapters",
    "hasAudioOnly",
    "avgRating",
    "ratingsCount",
    "expiration",
    "commentsCount",
    "whenModified",
    "closedCaptionsEnabled",
    "approval",
    "transcodeFailed",
    "source",
    "viewerIdEnabled",
    "hasDualStreams",
    "isConvertedToSwitched",
];

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    DEFAULT_SEARCH_COUNT
}

#[derive(Debug, Deserialize)]
pub struct VideoArgs {
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// Copy `fields` out of a JSON object, skipping absent keys.
pub fn project(value: &Value, fields: &[&str]) -> Value {
    let mut out = Map::new();
    if let Some(obj) = value.as_object() {
        for field in fields {
            if let Some(v) = obj.get(*field) {
                out.insert((*field).to_owned(), v.clone());
            }
        }
    }
    Value::Object(out)
}

fn video_url(state: &BridgeState, video_id: &str, suffix: &str) -> String {
    state.config.api_url(&format!("/api/v2/videos/{}/{suffix}", encode_component(video_id)))
}

pub async fn who_am_i(state: &BridgeState) -> ToolOutput {
    let url = state.config.api_url("/api/v2/users/me");
    match state.client.request(&url).await {
        ApiResponse::Json(user) if user.is_object() => ToolOutput::json(&project(&user, USER_FIELDS)),
        _ => ToolOutput::text("Failed to retrieve user data"),
    }
}

pub async fn search_videos(state: &BridgeState, args: SearchArgs) -> Result<ToolOutput, ToolError> {
    if !(MIN_SEARCH_COUNT..=MAX_SEARCH_COUNT).contains(&args.count) {
        return Err(ToolError::InvalidArguments(format!(
            "count must be between {MIN_SEARCH_COUNT} and {MAX_SEARCH_COUNT}"
        )));
    }
    let url = state.config.api_url(&format!(
        "/api/v2/videos/search?q={}&count={}&sortField=_score&sortDirection=desc",
        encode_component(&args.query),
        args.count
    ));
    Ok(match state.client.request(&url).await.into_value().await {
        Some(results) => ToolOutput::json(&results),
        None => ToolOutput::text("No results matching search criteria"),
    })
}

pub async fn video_details(state: &BridgeState, args: VideoArgs) -> ToolOutput {
    let url = video_url(state, &args.video_id, "details");
    match state.client.request(&url).await {
        ApiResponse::Json(video) => ToolOutput::json(&project(&video, VIDEO_DETAIL_FIELDS)),
        _ => ToolOutput::text("Failed to retrieve video details"),
    }
}

pub async fn video_chapters(state: &BridgeState, args: VideoArgs) -> ToolOutput {
    let url = video_url(state, &args.video_id, "chapters");
    match state.client.request(&url).await.into_value().await {
        Some(chapters) => ToolOutput::json(&chapters),
        None => ToolOutput::text("Failed to retrieve video chapters"),
    }
}

/// Transcripts come back as an SRT byte stream.
pub async fn video_transcripts(state: &BridgeState, args: VideoArgs) -> ToolOutput {
    let url = video_url(state, &args.video_id, "transcription-files/en");
    let transcript = match state.client.request(&url).await {
        resp @ (ApiResponse::Stream(_) | ApiResponse::Text(_)) => resp.into_text().await,
        _ => None,
    };
    match transcript {
        None => ToolOutput::text("Failed to retrieve video transcripts"),
        Some(text) if text.is_empty() => ToolOutput::text("Transcript is empty"),
        Some(text) => ToolOutput::json(&serde_json::json!({ "transcript": text })),
    }
}
