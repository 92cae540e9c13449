//! Axum route handlers that open a preview or print context for the current record.

use axum::{extract::State, response::Html};
use tracing::info;

use crate::errors::AppError;
use crate::print::page::{compose_page, RenderMode};
use crate::record::controller::RecordError;
use crate::state::AppState;

/// GET /api/v1/resume/preview
pub async fn handle_preview(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    open_context(&state, RenderMode::Preview)
}

/// GET /api/v1/resume/print
///
/// The returned page prints itself after the configured settling delay.
pub async fn handle_print(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    open_context(&state, RenderMode::Print)
}

fn open_context(state: &AppState, mode: RenderMode) -> Result<Html<String>, AppError> {
    let snapshot = state
        .controller
        .snapshot()
        .ok_or(RecordError::NoActiveRecord)?;
    let document = state.projector.project(&snapshot.record)?;
    info!(?mode, bytes = document.markup().len(), "opening rendering context");
    Ok(Html(compose_page(&document, mode, state.print_settle)))
}
