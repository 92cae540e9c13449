pub mod health;
pub mod long_poll;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::ingest::handlers as ingest;
use crate::print::handlers as print;
use crate::record::handlers as record;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Intake
        .route(
            "/api/v1/uploads",
            post(ingest::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/pipeline/status", get(ingest::handle_status))
        .route("/api/v1/notifications", get(ingest::handle_notifications))
        .route(
            "/api/v1/notifications/next",
            get(ingest::handle_next_notification),
        )
        // Editing
        .route("/api/v1/resume", get(record::handle_get_record))
        .route("/api/v1/resume/changes", get(record::handle_record_changes))
        .route("/api/v1/resume/fields", put(record::handle_set_field))
        .route(
            "/api/v1/resume/lists/:list/items",
            post(record::handle_append_item),
        )
        .route(
            "/api/v1/resume/lists/:list/items/:index",
            delete(record::handle_remove_item),
        )
        // Rendering
        .route("/api/v1/resume/preview", get(print::handle_preview))
        .route("/api/v1/resume/print", get(print::handle_print))
        .with_state(state)
}
