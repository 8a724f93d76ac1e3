use std::io;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use engine_logging::{engine_debug, engine_info, engine_warn};
use linkprobe_core::SessionMessage;
use linkprobe_engine::CheckEngine;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::session::{run_session, Inbound, SessionError, Transport};

#[derive(Clone)]
struct AppState {
    engine: CheckEngine,
}

pub fn router(engine: CheckEngine) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/test", get(health))
        .with_state(AppState { engine })
}

/// Serves until ctrl-c.
pub async fn serve(listener: TcpListener, engine: CheckEngine) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        engine_info!("linkprobe listening on {}", addr);
    }
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        engine_warn!("failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    engine_info!("shutdown requested");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Service operational" }))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let mut transport = WebSocketTransport { socket };
        let summary = run_session(&mut transport, &state.engine).await;
        engine_debug!(
            "session ended submitted={} emitted={} completed={}",
            summary.submitted,
            summary.emitted,
            summary.completed
        );
    })
}

struct WebSocketTransport {
    socket: WebSocket,
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn recv(&mut self) -> Inbound {
        match self.socket.recv().await {
            Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_owned()),
            Some(Ok(Message::Close(_))) | None => Inbound::Closed,
            Some(Ok(_)) => Inbound::Other,
            Some(Err(err)) => {
                engine_debug!("websocket receive failed: {}", err);
                Inbound::Closed
            }
        }
    }

    async fn send(&mut self, message: &SessionMessage) -> Result<(), SessionError> {
        let text = message.to_json()?;
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))
    }

    async fn close(&mut self) {
        if let Err(err) = self.socket.send(Message::Close(None)).await {
            engine_debug!("websocket close failed: {}", err);
        }
    }
}
