//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Eingehende Textframes werden als `ClientEvent` dekodiert und
//! an den `SignalingRelay` gegeben, ausgehende Ereignisse kommen aus der
//! Broadcaster-Queue der Verbindung.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Jeder eingehende Frame (auch Pong) setzt den Timeout zurueck
//! - Nach `verbindungs_timeout_sek` ohne Empfang wird mit Close-Frame
//!   getrennt; `0` deaktiviert den Timeout
//!
//! Beim Verbindungsende laeuft immer `SignalingRelay::verbindung_getrennt`.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use duett_core::ConnectionId;
use duett_protocol::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
    id: ConnectionId,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection mit frischer ConnectionId
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            peer_addr,
            id: ConnectionId::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird, der Timeout greift oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(self, mut socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let id = self.id;
        let relay = Arc::clone(&self.state.relay);
        let keepalive_intervall = self.state.config.keepalive_intervall();
        let timeout_dauer = self.state.config.verbindungs_timeout();

        let mut sende_rx = relay.verbindung_registrieren(id);
        self.state.metriken.connections_active.inc();
        tracing::info!(
            peer = %peer_addr,
            connection_id = %id,
            offen = relay.verbindungs_anzahl(),
            "Neue Verbindung"
        );

        let mut letzter_empfang = Instant::now();
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            if *shutdown_rx.borrow() {
                tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                schliessen(&mut socket, GRUND_SHUTDOWN).await;
                break;
            }

            let jetzt = Instant::now();

            // Timeout-Pruefung
            let timeout_rest = match timeout_dauer {
                Some(timeout) => {
                    let inaktiv = jetzt.duration_since(letzter_empfang);
                    if inaktiv >= timeout {
                        tracing::warn!(peer = %peer_addr, connection_id = %id, "Verbindungs-Timeout");
                        schliessen(&mut socket, GRUND_TIMEOUT).await;
                        break;
                    }
                    Some(timeout - inaktiv)
                }
                None => None,
            };

            let ping_verzoegerung = naechster_ping.saturating_duration_since(jetzt);

            tokio::select! {
                // Eingehender Frame vom Endpunkt
                frame = socket.recv() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            letzter_empfang = Instant::now();
                            match dekodieren(&text) {
                                Ok(ereignis) => relay.verarbeiten(id, ereignis),
                                Err(e) => {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        connection_id = %id,
                                        fehler = %e,
                                        "Ungueltiges Ereignis verworfen"
                                    );
                                    self.state.metriken.verworfen("invalid_frame");
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(peer = %peer_addr, connection_id = %id, "Verbindung vom Endpunkt getrennt");
                            break;
                        }
                        Some(Ok(Message::Binary(_))) => {
                            letzter_empfang = Instant::now();
                            tracing::debug!(peer = %peer_addr, "Binaerframe ignoriert");
                        }
                        Some(Ok(_)) => {
                            // Ping/Pong: axum beantwortet Pings selbst
                            letzter_empfang = Instant::now();
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                connection_id = %id,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = senden(&mut socket, &ausgehend).await {
                        tracing::warn!(
                            peer = %peer_addr,
                            connection_id = %id,
                            event = ausgehend.name(),
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if socket.send(Message::Ping(Vec::new())).await.is_err() {
                        tracing::warn!(peer = %peer_addr, connection_id = %id, "Ping-Senden fehlgeschlagen");
                        break;
                    }
                    naechster_ping = Instant::now() + keepalive_intervall;
                }

                // Inaktivitaets-Timeout
                _ = tokio::time::sleep(timeout_rest.unwrap_or(Duration::MAX)), if timeout_rest.is_some() => {
                    // Wird am Schleifenanfang ausgewertet
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    // Wird am Schleifenanfang ausgewertet
                }
            }
        }

        // Cleanup beim Verbindungsende
        relay.verbindung_getrennt(id);
        self.state.metriken.connections_active.dec();
        tracing::info!(peer = %peer_addr, connection_id = %id, "Verbindungs-Task beendet");
    }
}

/// Dekodiert einen Textframe als `ClientEvent`
fn dekodieren(text: &str) -> SignalingResult<ClientEvent> {
    ClientEvent::from_json(text).map_err(|e| SignalingError::protokoll(e.to_string()))
}

/// Serialisiert ein Ereignis und schreibt es als Textframe
async fn senden(socket: &mut WebSocket, ereignis: &ServerEvent) -> SignalingResult<()> {
    let json = ereignis
        .to_json()
        .map_err(|e| SignalingError::protokoll(e.to_string()))?;
    socket
        .send(Message::Text(json))
        .await
        .map_err(|_| SignalingError::SendFehler)
}

/// Schliessgrund beim Herunterfahren des Servers
const GRUND_SHUTDOWN: &str = "Server wird heruntergefahren";
/// Schliessgrund nach `verbindungs_timeout_sek` ohne Empfang
const GRUND_TIMEOUT: &str = "Zeitueberschreitung";

/// Sendet einen Close-Frame (`1001 Going Away`) mit Grund
async fn schliessen(socket: &mut WebSocket, grund: &'static str) {
    let abschied = CloseFrame {
        code: close_code::AWAY,
        reason: grund.into(),
    };
    let _ = socket.send(Message::Close(Some(abschied))).await;
}
