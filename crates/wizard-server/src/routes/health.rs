use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /health: liveness plus a little context.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": app.store().len(),
        "model": app.orchestrator.model(),
    }))
}
