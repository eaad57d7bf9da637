//! HTTP-Routen des Signaling-Service
//!
//! - `POST /api/call/generate` – Einladungslink ausstellen
//! - `GET  /ws`                – WebSocket-Upgrade auf den Ereigniskanal

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use duett_protocol::LinkResponse;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

/// Erstellt den Router fuer Link-Ausgabe und Ereigniskanal
pub fn signaling_router(state: Arc<SignalingState>) -> Router {
    Router::new()
        .route("/api/call/generate", post(link_generieren))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

/// `POST /api/call/generate`
pub async fn link_generieren(State(state): State<Arc<SignalingState>>) -> Json<LinkResponse> {
    Json(state.issuer.ausstellen())
}

/// `GET /ws` – startet pro Verbindung einen `ClientConnection`-Task
pub async fn ws_upgrade(
    State(state): State<Arc<SignalingState>>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let shutdown_rx = state.shutdown_abonnieren();
    ws.on_upgrade(move |socket| ClientConnection::neu(state, peer_addr).verarbeiten(socket, shutdown_rx))
        .into_response()
}
