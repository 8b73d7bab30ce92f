use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use wizard_core::document::COMBINED_FILE_NAME;
use wizard_core::steps;
use wizard_core::store::parse_session_id;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    /// Missing and blank are both rejected with 400.
    #[serde(default)]
    pub system_description: String,
}

/// GET /api/sessions: all sessions, oldest first.
pub async fn list_sessions(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "sessions": app.store().list() }))
}

/// POST /api/sessions: create a session without running any step.
pub async fn create_session(
    State(app): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let session = app.orchestrator.start(&body.system_description)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "session": session })),
    ))
}

/// GET /api/sessions/:id: full session.
pub async fn get_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = app.orchestrator.session(parse_session_id(&id)?)?;
    Ok(Json(serde_json::json!({ "session": session })))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uuid = parse_session_id(&id)?;
    if !app.store().delete(uuid) {
        return Err(wizard_core::WizardError::SessionNotFound(id).into());
    }
    Ok(Json(serde_json::json!({ "message": "Session deleted" })))
}

/// GET /api/sessions/:id/steps/:index: one step's output, `null` if not run.
pub async fn get_step_output(
    State(app): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = app.orchestrator.session(parse_session_id(&id)?)?;
    let def = steps::step(index)?;
    Ok(Json(serde_json::json!({
        "step": def.info(index),
        "output": session.output(def.output_key),
    })))
}

/// GET /api/sessions/:id/download: combined markdown as an attachment.
pub async fn download(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = app.orchestrator.document(parse_session_id(&id)?)?;
    let disposition = format!("attachment; filename={COMBINED_FILE_NAME}");
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc,
    ))
}
