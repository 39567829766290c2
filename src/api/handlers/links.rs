use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::redirect::{Navigator, Resolution, ERROR_MESSAGE, NOT_FOUND_MESSAGE, REDIRECTING_MESSAGE};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: String,
    pub path: String,
}

/// Look up a token for clients that resolve the fragment themselves.
/// Route: GET /links/:token
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<JSend<LinkResponse>>, ApiError> {
    match state.resolver.resolve(&token).await {
        Resolution::Redirect(path) => Ok(JSend::success(LinkResponse { id: token, path })),
        Resolution::Failed => Err(ApiError::bad_gateway(ERROR_MESSAGE)),
        Resolution::NotFound | Resolution::Idle => Err(ApiError::not_found(NOT_FOUND_MESSAGE)),
    }
}

/// Follow a short link: 303 to the stored object, or a static message page.
/// Route: GET /go/:token
pub async fn follow_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    let mut page = PageNavigator::default();
    let resolution = state.resolver.run(&token, &mut page).await;

    let status = match resolution {
        Resolution::Redirect(_) => StatusCode::SEE_OTHER,
        Resolution::Failed => StatusCode::BAD_GATEWAY,
        Resolution::NotFound | Resolution::Idle => StatusCode::NOT_FOUND,
    };
    page.into_response(status)
}

/// Collects what a browser page would show into an HTTP response.
#[derive(Default)]
struct PageNavigator {
    location: Option<String>,
    message: Option<String>,
}

impl Navigator for PageNavigator {
    fn show_redirecting(&mut self) {
        self.message = Some(REDIRECTING_MESSAGE.to_string());
    }

    fn navigate(&mut self, url: &str) {
        self.location = Some(url.to_string());
    }

    fn show_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }
}

impl PageNavigator {
    fn into_response(self, status: StatusCode) -> Response {
        if let Some(location) = self.location {
            return match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
                Err(_) => {
                    tracing::warn!(location = %location, "Stored path is not a valid Location");
                    message_page(StatusCode::BAD_GATEWAY, ERROR_MESSAGE)
                }
            };
        }
        let message = self.message.as_deref().unwrap_or(NOT_FOUND_MESSAGE);
        message_page(status, message)
    }
}

fn message_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!doctype html><html><body style=\"background:#111;color:#fff\">\
         <h2 style=\"text-align:center;margin-top:3rem\">{message}</h2></body></html>"
    );
    (status, Html(body)).into_response()
}
