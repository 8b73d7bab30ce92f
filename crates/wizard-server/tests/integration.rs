use std::sync::Arc;

use axum::http::StatusCode;
use claude_client::MockCompleter;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wizard_core::config::RunMode;
use wizard_core::types::OutputKey;
use wizard_core::{Orchestrator, SessionStore};
use wizard_server::{build_router, AppState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app_state(mode: RunMode) -> AppState {
    let orch = Orchestrator::new(
        Arc::new(SessionStore::new()),
        Arc::new(MockCompleter::new()),
    );
    AppState::new(orch, mode)
}

async fn send(app: axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn delete(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

// ---------------------------------------------------------------------------
// Health and registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_sessions_and_model() {
    let state = app_state(RunMode::Development);
    state.orchestrator.start("one").unwrap();
    let (status, json) = get(build_router(state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 1);
    assert_eq!(json["model"], "mock-model");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn steps_lists_registry_in_order() {
    let (status, json) = get(build_router(app_state(RunMode::Development)), "/api/steps").await;
    assert_eq!(status, StatusCode::OK);
    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 7);
    assert_eq!(steps[0]["id"], "businessAnalyst");
    assert_eq!(steps[1]["reviseTarget"], 0);
    assert_eq!(steps[1]["inDocument"], false);
    assert_eq!(steps[6]["outputKey"], "sdlcTaskAllocation");
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_session() {
    let state = app_state(RunMode::Development);
    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/sessions",
        serde_json::json!({ "systemDescription": "A booking system" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["session"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["session"]["systemDescription"], "A booking system");

    let (status, json) = get(build_router(state), &format!("/api/sessions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session"]["currentStep"], 0);
}

#[tokio::test]
async fn create_session_rejects_blank_description() {
    let state = app_state(RunMode::Development);
    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/sessions",
        serde_json::json!({ "systemDescription": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("description"));

    let (status, _) = post_json(build_router(state.clone()), "/api/sessions", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn list_sessions_oldest_first() {
    let state = app_state(RunMode::Development);
    let a = state.orchestrator.start("first").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    state.orchestrator.start("second").unwrap();
    let (status, json) = get(build_router(state), "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], a.id.to_string());
}

#[tokio::test]
async fn unknown_session_is_404() {
    let app = build_router(app_state(RunMode::Development));
    let (status, json) = get(app.clone(), "/api/sessions/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().starts_with("Session not found"));

    let missing = uuid::Uuid::new_v4();
    let (status, _) = get(app.clone(), &format!("/api/sessions/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = delete(app, &format!("/api/sessions/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_session_removes_it() {
    let state = app_state(RunMode::Development);
    let s = state.orchestrator.start("x").unwrap();
    let (status, json) = delete(build_router(state.clone()), &format!("/api/sessions/{}", s.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Session deleted");
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn step_output_returns_saved_text() {
    let state = app_state(RunMode::Development);
    let s = state.orchestrator.start("x").unwrap();
    state
        .store()
        .save_output(s.id, OutputKey::Requirements, Some("stories".into()))
        .unwrap();

    let app = build_router(state);
    let (status, json) = get(app.clone(), &format!("/api/sessions/{}/steps/0", s.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"], "stories");
    assert_eq!(json["step"]["name"], "Requirements & User Stories");

    let (status, json) = get(app.clone(), &format!("/api/sessions/{}/steps/3", s.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["output"].is_null());

    let (status, _) = get(app, &format!("/api/sessions/{}/steps/7", s.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_is_markdown_attachment_without_review() {
    let state = app_state(RunMode::Development);
    let s = state.orchestrator.start("A payroll tool").unwrap();
    state
        .store()
        .save_output(s.id, OutputKey::Requirements, Some("REQS".into()))
        .unwrap();
    state
        .store()
        .save_output(s.id, OutputKey::RequirementsReview, Some("GAPS".into()))
        .unwrap();

    let req = axum::http::Request::builder()
        .uri(format!("/api/sessions/{}/download", s.id))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = build_router(state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/markdown"));
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=COMPLETE-DOCUMENTATION.md"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("# Software Development Lifecycle Documentation"));
    assert!(text.contains("A payroll tool"));
    assert!(text.contains("REQS"));
    assert!(!text.contains("GAPS"));
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn production_keeps_client_error_detail() {
    let app = build_router(app_state(RunMode::Production));
    let (status, json) = post_json(
        app,
        "/api/sessions",
        serde_json::json!({ "systemDescription": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "system description is required");
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let state = app_state(RunMode::Development).with_frontend_url("http://localhost:5173");
    let req = axum::http::Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:5173")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = build_router(state).oneshot(req).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let req = axum::http::Request::builder()
        .uri("/health")
        .header("origin", "http://example.test")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = build_router(app_state(RunMode::Development))
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

// ---------------------------------------------------------------------------
// WebSocket transport
// ---------------------------------------------------------------------------

mod socket {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Client =
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    async fn connect() -> Client {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(wizard_server::serve_on(
            app_state(RunMode::Development),
            listener,
            false,
        ));
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        ws
    }

    async fn send_text(ws: &mut Client, text: &str) {
        ws.send(Message::Text(text.to_string().into())).await.unwrap();
    }

    /// Next text frame as JSON, skipping control frames.
    async fn next_event(ws: &mut Client) -> serde_json::Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .unwrap();
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn frames_arrive_in_order_and_bad_frames_keep_socket_open() {
        let mut ws = connect().await;

        send_text(
            &mut ws,
            r#"{"event":"wizard:start","data":{"systemDescription":"A todo app"}}"#,
        )
        .await;
        send_text(&mut ws, "not json").await;

        let created = next_event(&mut ws).await;
        assert_eq!(created["event"], "session:created");
        let session_id = created["data"]["sessionId"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(session_id).is_ok());

        let started = next_event(&mut ws).await;
        assert_eq!(started["event"], "step:started");
        assert_eq!(started["data"]["step"], "businessAnalyst");
        assert_eq!(started["data"]["stepIndex"], 0);

        let completed = next_event(&mut ws).await;
        assert_eq!(completed["event"], "step:completed");
        assert_eq!(completed["data"]["stepIndex"], 0);
        assert!(!completed["data"]["output"].as_str().unwrap().is_empty());

        let error = next_event(&mut ws).await;
        assert_eq!(error["event"], "error");
        assert!(error["data"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid message"));

        // Still usable after the malformed frame.
        send_text(&mut ws, r#"{"event":"step:accept","data":{"stepIndex":0}}"#).await;
        let next = next_event(&mut ws).await;
        assert_eq!(next["event"], "step:started");
        assert_eq!(next["data"]["stepIndex"], 1);
        let next = next_event(&mut ws).await;
        assert_eq!(next["event"], "step:completed");
        assert_eq!(next["data"]["step"], "requirementsReviewer");

    }

    #[tokio::test]
    async fn close_ends_the_connection() {
        let mut ws = connect().await;
        ws.close(None).await.unwrap();

        let ended = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(msg) = ws.next().await {
                if msg.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(ended.is_ok(), "server did not finish the close handshake");
    }
}
