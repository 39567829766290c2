use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::share_error;
use crate::api::events::{stream_upload, TracingPresenter};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::share::{Payload, ShareError, ShortLink};
use crate::ui::{present_upload, ProgressTarget};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub id: String,
    pub link: String,
    pub message: String,
    pub path: String,
}

impl ShareResponse {
    pub fn new(link: ShortLink, target: ProgressTarget) -> Self {
        Self {
            id: link.id,
            link: link.link,
            message: target.success_message().to_string(),
            path: link.path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTextRequest {
    #[serde(default)]
    pub content: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let limit = state.config.max_upload_size;
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Invalid multipart data", limit))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file", limit))?;

        if data.len() as u64 > limit {
            return Err(too_large(limit));
        }

        file = Some((file_name, content_type, data));
    }

    let payload = match file {
        Some((name, content_type, data)) => {
            Payload::file(name.as_deref(), data, content_type.as_deref())
        }
        None => Err(ShareError::NoFile),
    };

    respond(state, &headers, ProgressTarget::File, payload).await
}

pub async fn create_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<CreateTextRequest>,
) -> Result<Response, ApiError> {
    let payload = Payload::text(&req.content);
    respond(state, &headers, ProgressTarget::Text, payload).await
}

// ============================================================================
// Helpers
// ============================================================================

/// Answer with a single JSend document, or with a progress event stream when
/// the client asked for one.
async fn respond(
    state: Arc<AppState>,
    headers: &HeaderMap,
    target: ProgressTarget,
    payload: Result<Payload, ShareError>,
) -> Result<Response, ApiError> {
    if wants_event_stream(headers) {
        return Ok(stream_upload(state, target, payload).into_response());
    }

    let link = present_upload(&TracingPresenter, target, &state.sharer, payload)
        .await
        .map_err(|e| share_error(target, e))?;

    Ok(JSend::success(ShareResponse::new(link, target)).into_response())
}

fn too_large(limit: u64) -> ApiError {
    ApiError::payload_too_large(format!("File exceeds maximum upload size of {limit} bytes"))
}

/// The body limit surfaces as a multipart error once the stream is cut off.
fn multipart_error(e: MultipartError, context: &str, limit: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(limit);
    }
    ApiError::bad_request(format!("{context}: {e}"))
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"))
}
