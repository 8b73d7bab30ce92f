use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::socket::{Connection, ServerEvent};
use crate::state::AppState;

/// GET /ws: upgrade to the wizard socket protocol.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unserializable socket event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::info!("socket connected");
    let mut conn = Connection::new(app, tx);
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => conn.handle_text(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "socket read failed");
                break;
            }
        }
    }
    tracing::info!(session = ?conn.session_id(), "socket disconnected");

    // Dropping the connection closes the channel, which ends the writer.
    drop(conn);
    let _ = writer.await;
}
