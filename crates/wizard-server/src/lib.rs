pub mod error;
pub mod routes;
pub mod sanitize;
pub mod socket;
pub mod state;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(app_state.frontend_url.as_deref()))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // WebSocket
        .route("/ws", get(routes::ws::ws_handler))
        // Steps
        .route("/api/steps", get(routes::steps::list_steps))
        // Sessions
        .route(
            "/api/sessions",
            get(routes::sessions::list_sessions).post(routes::sessions::create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(routes::sessions::get_session).delete(routes::sessions::delete_session),
        )
        .route(
            "/api/sessions/{id}/steps/{index}",
            get(routes::sessions::get_step_output),
        )
        .route(
            "/api/sessions/{id}/download",
            get(routes::sessions::download),
        )
        .layer(middleware::from_fn_with_state(
            app_state.mode,
            sanitize::sanitize_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn allowed_origin(frontend_url: Option<&str>) -> AllowOrigin {
    let Some(url) = frontend_url else {
        return AllowOrigin::any();
    };
    match HeaderValue::from_str(url.trim_end_matches('/')) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(frontend_url = url, error = %e, "invalid frontend URL, allowing any origin");
            AllowOrigin::any()
        }
    }
}

/// Start the wizard server on `port`.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the wizard server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port). Stops on Ctrl-C.
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let mode = app_state.mode;
    let model = app_state.orchestrator.model().to_string();
    let app = build_router(app_state);

    tracing::info!(%mode, %model, "SDLC wizard server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
