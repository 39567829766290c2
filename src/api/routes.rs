use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Uploads
        .route(
            "/files",
            post(handlers::create_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/text",
            post(handlers::create_text).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Short links
        .route("/links/:token", get(handlers::get_link))
        .route("/go/:token", get(handlers::follow_link))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Objects are only ours to serve when they live on local disk
    if state.local_store.is_some() {
        router = router.route("/public/:bucket/*key", get(handlers::serve_public));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
