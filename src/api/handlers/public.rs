use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::object_store::ObjectStoreError;
use crate::AppState;

/// Serve an object from the local bucket by key.
/// Route: GET /public/:bucket/*key
pub async fn serve_public(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let store = state
        .local_store
        .as_ref()
        .filter(|store| store.bucket() == bucket)
        .ok_or_else(|| ApiError::not_found("Bucket not found"))?;

    let data = store.get(&key).await.map_err(|e| match e {
        ObjectStoreError::NotFound(_) | ObjectStoreError::InvalidKey(_) => {
            ApiError::not_found("Object not found")
        }
        _ => ApiError::internal(format!("Failed to retrieve object: {e}")),
    })?;

    let byte_size = data.len() as u64;
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&key).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(byte_size));

    if let Ok(value) = format!("inline; filename=\"{key}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Keys carry an upload timestamp, so an object under a key rarely changes
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}
