//! Connection-Broadcaster – Stellt Ereignisse an einzelne Verbindungen zu
//!
//! Der Broadcaster verwaltet die Send-Queues aller offenen Verbindungen.
//! Zustellung ist fire-and-forget: eine volle oder geschlossene Queue
//! verwirft das Ereignis, der Absender erfaehrt davon nichts.

use dashmap::DashMap;
use duett_core::ConnectionId;
use duett_protocol::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Zustellergebnis
// ---------------------------------------------------------------------------

/// Ergebnis eines Zustellversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    /// In die Queue eingereiht
    Eingereiht,
    /// Queue voll, Ereignis verworfen
    QueueVoll,
    /// Verbindung unbekannt oder Queue geschlossen
    Getrennt,
}

impl Zustellung {
    pub fn ist_eingereiht(self) -> bool {
        self == Self::Eingereiht
    }
}

// ---------------------------------------------------------------------------
// VerbindungsSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
struct VerbindungsSender {
    connection_id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

impl VerbindungsSender {
    /// Sendet ein Ereignis nicht-blockierend an die Verbindung
    fn senden(&self, ereignis: ServerEvent) -> Zustellung {
        match self.tx.try_send(ereignis) {
            Ok(()) => Zustellung::Eingereiht,
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    event = ev.name(),
                    "Send-Queue voll – Ereignis verworfen"
                );
                Zustellung::QueueVoll
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                Zustellung::Getrennt
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Zusteller fuer alle offenen Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct ConnectionBroadcaster {
    verbindungen: Arc<DashMap<ConnectionId, VerbindungsSender>>,
}

impl ConnectionBroadcaster {
    /// Erstellt einen neuen ConnectionBroadcaster
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und schreibt in den
    /// WebSocket.
    pub fn verbindung_registrieren(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.verbindungen
            .insert(connection_id, VerbindungsSender { connection_id, tx });
        tracing::debug!(connection_id = %connection_id, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn verbindung_entfernen(&self, connection_id: &ConnectionId) {
        if self.verbindungen.remove(connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Verbindung aus Broadcaster entfernt");
        }
    }

    /// Sendet ein Ereignis an eine einzelne Verbindung
    pub fn an_verbindung_senden(
        &self,
        connection_id: &ConnectionId,
        ereignis: ServerEvent,
    ) -> Zustellung {
        // Sender klonen, damit kein DashMap-Guard waehrend try_send gehalten wird
        let sender = self.verbindungen.get(connection_id).map(|s| s.clone());
        match sender {
            Some(sender) => sender.senden(ereignis),
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    event = ereignis.name(),
                    "Senden an unbekannte Verbindung"
                );
                Zustellung::Getrennt
            }
        }
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn verbindungs_anzahl(&self) -> usize {
        self.verbindungen.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.verbindungen.contains_key(connection_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
