//! Axum route handlers for editing the current record.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::record::controller::{RecordError, RecordSnapshot};
use crate::record::schema::{FieldPath, ListField};
use crate::routes::long_poll::LongPoll;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub path: FieldPath,
    pub value: String,
}

/// GET /api/v1/resume
pub async fn handle_get_record(
    State(state): State<AppState>,
) -> Result<Json<RecordSnapshot>, AppError> {
    let snapshot = state
        .controller
        .snapshot()
        .ok_or(RecordError::NoActiveRecord)?;
    Ok(Json(snapshot))
}

/// GET /api/v1/resume/changes?wait_ms=
///
/// Long-poll for the next republished snapshot. The body is the new snapshot, or `null`
/// when a new upload cleared the record. Returns 204 if nothing changes within the wait.
pub async fn handle_record_changes(
    State(state): State<AppState>,
    Query(poll): Query<LongPoll>,
) -> Response {
    let mut rx = state.controller.subscribe();
    match tokio::time::timeout(poll.wait(), rx.changed()).await {
        Ok(Ok(())) => {
            let snapshot = rx.borrow_and_update().clone();
            Json(snapshot).into_response()
        }
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

/// PUT /api/v1/resume/fields
///
/// Accepts `{ "path": "name" | "personalScorecard[1]", "value": "..." }`.
pub async fn handle_set_field(
    State(state): State<AppState>,
    Json(req): Json<SetFieldRequest>,
) -> Result<Json<RecordSnapshot>, AppError> {
    let snapshot = state.controller.set_field(&req.path, req.value)?;
    Ok(Json(snapshot))
}

/// POST /api/v1/resume/lists/:list/items
pub async fn handle_append_item(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> Result<Json<RecordSnapshot>, AppError> {
    let list = parse_list(&list)?;
    Ok(Json(state.controller.append_list_item(list)?))
}

/// DELETE /api/v1/resume/lists/:list/items/:index
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((list, index)): Path<(String, usize)>,
) -> Result<Json<RecordSnapshot>, AppError> {
    let list = parse_list(&list)?;
    Ok(Json(state.controller.remove_list_item(list, index)?))
}

fn parse_list(key: &str) -> Result<ListField, AppError> {
    ListField::from_key(key).ok_or_else(|| AppError::Validation(format!("'{key}' is not a list field")))
}
