//! Axum route handlers for uploads, run status and notifications.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::ingest::extractors::UploadedFile;
use crate::ingest::notify::Notification;
use crate::ingest::orchestrator::PipelineStatus;
use crate::routes::long_poll::LongPoll;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/uploads
///
/// Multipart form with a single `file` part. Starts a new run (superseding any run in
/// flight) and returns `202 { "run_id": n }` without waiting for it to finish.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let file = read_file_part(&mut multipart).await?;
    info!(name = %file.name, mime_type = %file.mime_type, bytes = file.bytes.len(), "upload received");

    let handle = state.orchestrator.submit(file)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "run_id": handle.run_id }))))
}

/// GET /api/v1/pipeline/status
pub async fn handle_status(State(state): State<AppState>) -> Json<PipelineStatus> {
    Json(state.orchestrator.status())
}

/// GET /api/v1/notifications
/// Returns the most recent notifications, oldest first.
pub async fn handle_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifier.recent())
}

/// GET /api/v1/notifications/next?wait_ms=
///
/// Long-poll for the next notification published after the request arrives.
/// Returns 204 if none arrives within the wait.
pub async fn handle_next_notification(
    State(state): State<AppState>,
    Query(poll): Query<LongPoll>,
) -> Response {
    let mut rx = state.notifier.subscribe();
    let next = tokio::time::timeout(poll.wait(), async {
        loop {
            match rx.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "notification poller lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    match next {
        Ok(Some(notification)) => Json(notification).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn read_file_part(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
        return Ok(UploadedFile {
            bytes,
            name,
            mime_type,
        });
    }
    Err(AppError::Validation(format!(
        "Multipart body has no '{FILE_FIELD}' part"
    )))
}
