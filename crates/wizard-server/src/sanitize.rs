use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use wizard_core::config::RunMode;

pub const GENERIC_ERROR: &str = "Internal server error";
pub const TRANSIENT_ERROR: &str = "Transient API error";

/// Axum middleware that hides server-side failure detail in production.
///
/// 1. `Development` → passthrough
/// 2. Status below 500 → passthrough (client errors stay descriptive)
/// 3. Otherwise the body becomes `{"error": "Internal server error"}` with the
///    original status kept
pub async fn sanitize_errors(State(mode): State<RunMode>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if !mode.is_production() || !response.status().is_server_error() {
        return response;
    }
    let status = response.status();
    (status, Json(serde_json::json!({ "error": GENERIC_ERROR }))).into_response()
}

/// Text sent to a socket client when a step fails.
pub fn step_error_message(mode: RunMode, step_name: &str, detail: &str) -> String {
    if mode.is_production() {
        format!("Failed to execute {step_name}")
    } else {
        detail.to_string()
    }
}

/// Text sent with `step:retrying`. The step has not failed yet, so production
/// gets no step-failure wording.
pub fn retry_notice(mode: RunMode, detail: &str) -> String {
    if mode.is_production() {
        TRANSIENT_ERROR.to_string()
    } else {
        detail.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn boom() -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": "upstream said: key sk-123 rejected" })),
        )
    }

    async fn bad_request() -> (StatusCode, &'static str) {
        (StatusCode::BAD_REQUEST, "system description is required")
    }

    fn test_app(mode: RunMode) -> Router {
        Router::new()
            .route("/boom", get(boom))
            .route("/bad", get(bad_request))
            .layer(middleware::from_fn_with_state(mode, sanitize_errors))
    }

    async fn body_of(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn production_hides_server_errors() {
        let (status, body) = body_of(test_app(RunMode::Production), "/boom").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn production_keeps_client_errors() {
        let (status, body) = body_of(test_app(RunMode::Production), "/bad").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("system description"));
    }

    #[tokio::test]
    async fn development_passes_detail_through() {
        let (_, body) = body_of(test_app(RunMode::Development), "/boom").await;
        assert!(body.contains("sk-123"));
    }

    #[test]
    fn step_error_message_by_mode() {
        assert_eq!(
            step_error_message(RunMode::Production, "Testing Strategy", "API error 500"),
            "Failed to execute Testing Strategy"
        );
        assert_eq!(
            step_error_message(RunMode::Development, "Testing Strategy", "API error 500"),
            "API error 500"
        );
    }

    #[test]
    fn retry_notice_by_mode() {
        assert_eq!(
            retry_notice(RunMode::Production, "API error 503: overloaded"),
            TRANSIENT_ERROR
        );
        assert_eq!(
            retry_notice(RunMode::Development, "API error 503: overloaded"),
            "API error 503: overloaded"
        );
    }
}
