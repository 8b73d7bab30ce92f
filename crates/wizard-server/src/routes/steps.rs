use axum::Json;
use wizard_core::steps;

/// GET /api/steps: the step registry in execution order.
pub async fn list_steps() -> Json<serde_json::Value> {
    let list: Vec<steps::StepInfo> = steps::registry()
        .iter()
        .enumerate()
        .map(|(i, s)| s.info(i))
        .collect();
    Json(serde_json::json!({ "steps": list }))
}
