//! Signaling-Relay – Protokoll-Zustandsmaschine pro Raum
//!
//! Jeder Uebergang laeuft vollstaendig unter dem Registry-Mutex; Zustellung
//! an die Gegenseite ist nicht-blockierend (`try_send`) und findet daher
//! ebenfalls unter dem Lock statt. Damit sind alle Uebergaenge zueinander
//! atomar.
//!
//! ## Uebergaenge
//! ```text
//! caller-join    -> Raum bei Bedarf anlegen, Anrufer setzen, caller-ready
//! callee-join    -> Angerufener setzen, callee-joined an Anrufer, callee-ready
//! offer          -> an Angerufenen
//! answer         -> an Anrufer
//! ice-candidate  -> an Gegenseite
//! text-message   -> an Gegenseite (mit Absender)
//! hangup         -> hangup an Gegenseite, Raum loeschen
//! Trennung       -> peer-disconnected an Gegenseite, Raum loeschen
//! ```
//!
//! Ereignisse fuer unbekannte Raeume oder leere Rollen werden still
//! verworfen (Debug-Log + Metrik).

use chrono::Utc;
use duett_core::{ConnectionId, RoomId};
use duett_observability::DuettMetrics;
use duett_protocol::signal::{
    AnswerRequest, CallerJoinRequest, CalleeJoinRequest, HangupRequest, IceCandidateRequest,
    OfferRequest, TextMessageRequest, FEHLER_RAUM_ABGELAUFEN,
};
use duett_protocol::{ClientEvent, ServerEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::broadcast::{ConnectionBroadcaster, Zustellung};
use crate::error::{SignalingError, SignalingResult};
use crate::registry::{Rolle, RoomRegistry, RoomState};

// ---------------------------------------------------------------------------
// Rollen-Politik
// ---------------------------------------------------------------------------

/// Verhalten beim Beitritt in eine bereits belegte Rolle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollenPolitik {
    /// Der neue Beitritt verdraengt den bisherigen Inhaber
    #[default]
    LetzterGewinnt,
    /// Beitritt wird mit `role-taken` abgelehnt, solange der Inhaber noch
    /// verbunden ist
    Exklusiv,
}

// ---------------------------------------------------------------------------
// Verwurfsgruende (Metrik-Labels)
// ---------------------------------------------------------------------------

const GRUND_RAUM_FEHLT: &str = "room_missing";
const GRUND_ROLLE_LEER: &str = "role_empty";
const GRUND_QUEUE_VOLL: &str = "queue_full";
const GRUND_GETRENNT: &str = "disconnected";

// ---------------------------------------------------------------------------
// SignalingRelay
// ---------------------------------------------------------------------------

/// Zustandsmaschine ueber alle Raeume
pub struct SignalingRelay {
    registry: Mutex<RoomRegistry>,
    broadcaster: ConnectionBroadcaster,
    politik: RollenPolitik,
    metriken: DuettMetrics,
}

impl SignalingRelay {
    /// Erstellt einen neuen Relay mit leerer Registry
    pub fn neu(politik: RollenPolitik, metriken: DuettMetrics) -> Self {
        Self {
            registry: Mutex::new(RoomRegistry::neu()),
            broadcaster: ConnectionBroadcaster::neu(),
            politik,
            metriken,
        }
    }

    pub fn politik(&self) -> RollenPolitik {
        self.politik
    }

    pub fn metriken(&self) -> &DuettMetrics {
        &self.metriken
    }

    // -----------------------------------------------------------------------
    // Verbindungen
    // -----------------------------------------------------------------------

    /// Registriert eine neue Verbindung und gibt ihre Ausgangs-Queue zurueck
    pub fn verbindung_registrieren(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<ServerEvent> {
        self.broadcaster.verbindung_registrieren(connection_id)
    }

    /// Anzahl offener Verbindungen
    pub fn verbindungs_anzahl(&self) -> usize {
        self.broadcaster.verbindungs_anzahl()
    }

    /// Transport-Trennung: loescht jeden Raum in dem die Verbindung eine
    /// Rolle haelt und benachrichtigt die jeweilige Gegenseite
    ///
    /// Idempotent; ein zweiter Aufruf findet keine Raeume mehr.
    pub fn verbindung_getrennt(&self, connection_id: ConnectionId) {
        // Zuerst abmelden: ab hier gilt die Verbindung fuer `Exklusiv` als veraltet
        self.broadcaster.verbindung_entfernen(&connection_id);

        let mut registry = self.registry.lock();
        let raeume = registry.raeume_von(&connection_id);
        for room_id in raeume {
            let Some(raum) = registry.entfernen(&room_id) else {
                continue;
            };
            if let Some(andere) = raum.gegenueber(&connection_id) {
                if andere != connection_id {
                    self.zustellen(&andere, ServerEvent::PeerDisconnected);
                }
            }
            self.metriken.raum_geschlossen("disconnect");
            tracing::info!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Raum nach Verbindungsabbruch geloescht"
            );
        }
        self.gauge_aktualisieren(&registry);
    }

    // -----------------------------------------------------------------------
    // Registry-Zugriff
    // -----------------------------------------------------------------------

    /// Legt einen leeren Raum an (Link-Ausgabe)
    ///
    /// Gibt `false` zurueck wenn die ID bereits lebt.
    pub fn raum_vorregistrieren(&self, room_id: RoomId, seed: &str) -> bool {
        let mut registry = self.registry.lock();
        let neu = registry.registrieren(RoomState::neu(room_id, seed));
        self.gauge_aktualisieren(&registry);
        neu
    }

    /// Momentaufnahme eines Raums
    pub fn raum(&self, room_id: &RoomId) -> Option<RoomState> {
        self.registry.lock().get(room_id).cloned()
    }

    /// Raeume in denen die Verbindung eine Rolle haelt
    pub fn raeume_von(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.registry.lock().raeume_von(connection_id)
    }

    /// Anzahl lebender Raeume
    pub fn raum_anzahl(&self) -> usize {
        self.registry.lock().anzahl()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Verarbeitet ein eingehendes Ereignis einer Verbindung
    ///
    /// Fehler mit Draht-Meldung gehen als `error`-Ereignis an den Absender.
    pub fn verarbeiten(&self, connection_id: ConnectionId, ereignis: ClientEvent) {
        let name = ereignis.name();
        self.metriken
            .signal_events_total
            .with_label_values(&[name])
            .inc();
        tracing::trace!(
            connection_id = %connection_id,
            room_id = %ereignis.room_id(),
            event = name,
            "Ereignis empfangen"
        );

        let ergebnis = match ereignis {
            ClientEvent::CallerJoin(req) => self.caller_join(connection_id, req),
            ClientEvent::CalleeJoin(req) => self.callee_join(connection_id, req),
            ClientEvent::Offer(req) => {
                self.offer(connection_id, req);
                Ok(())
            }
            ClientEvent::Answer(req) => {
                self.answer(connection_id, req);
                Ok(())
            }
            ClientEvent::IceCandidate(req) => {
                self.ice_candidate(connection_id, req);
                Ok(())
            }
            ClientEvent::TextMessage(req) => {
                self.text_message(connection_id, req);
                Ok(())
            }
            ClientEvent::Hangup(req) => {
                self.hangup(connection_id, req);
                Ok(())
            }
        };

        if let Err(fehler) = ergebnis {
            tracing::debug!(
                connection_id = %connection_id,
                event = name,
                fehler = %fehler,
                "Ereignis abgelehnt"
            );
            if let Some(meldung) = fehler.wire_message() {
                self.zustellen(&connection_id, ServerEvent::error(meldung));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Uebergaenge
    // -----------------------------------------------------------------------

    /// `caller-join`: legt den Raum bei Bedarf mit dem mitgelieferten Seed an
    pub fn caller_join(
        &self,
        connection_id: ConnectionId,
        req: CallerJoinRequest,
    ) -> SignalingResult<()> {
        let mut registry = self.registry.lock();

        if !registry.enthaelt(&req.room_id) {
            registry.registrieren(RoomState::neu(req.room_id.clone(), req.seed));
            tracing::info!(room_id = %req.room_id, "Raum beim caller-join angelegt");
        }

        self.rolle_pruefen(&registry, &req.room_id, Rolle::Anrufer, connection_id)?;
        let vorher = registry.rolle_setzen(&req.room_id, Rolle::Anrufer, connection_id);
        if let Some(Some(alt)) = vorher {
            if alt != connection_id {
                tracing::debug!(room_id = %req.room_id, alt = %alt, "Anrufer ersetzt");
            }
        }
        self.gauge_aktualisieren(&registry);

        tracing::info!(room_id = %req.room_id, connection_id = %connection_id, "Anrufer beigetreten");
        self.zustellen(&connection_id, ServerEvent::CallerReady);
        Ok(())
    }

    /// `callee-join`: nur auf bestehende Raeume, legt nie einen Raum an
    pub fn callee_join(
        &self,
        connection_id: ConnectionId,
        req: CalleeJoinRequest,
    ) -> SignalingResult<()> {
        let mut registry = self.registry.lock();

        if !registry.enthaelt(&req.room_id) {
            return Err(SignalingError::RaumNichtGefunden(req.room_id));
        }

        self.rolle_pruefen(&registry, &req.room_id, Rolle::Angerufener, connection_id)?;
        registry.rolle_setzen(&req.room_id, Rolle::Angerufener, connection_id);

        let anrufer = registry.get(&req.room_id).and_then(|raum| raum.caller);
        tracing::info!(room_id = %req.room_id, connection_id = %connection_id, "Angerufener beigetreten");

        if let Some(anrufer) = anrufer {
            self.zustellen(&anrufer, ServerEvent::CalleeJoined);
        }
        self.zustellen(&connection_id, ServerEvent::CalleeReady);
        Ok(())
    }

    /// `offer`: an den Angerufenen
    pub fn offer(&self, connection_id: ConnectionId, req: OfferRequest) {
        let registry = self.registry.lock();
        let ziel = match registry.get(&req.room_id) {
            Some(raum) => raum.callee,
            None => return self.raum_fehlt(&req.room_id, connection_id, "offer"),
        };
        self.weiterleiten(ziel, ServerEvent::Offer { offer: req.offer });
    }

    /// `answer`: an den Anrufer
    pub fn answer(&self, connection_id: ConnectionId, req: AnswerRequest) {
        let registry = self.registry.lock();
        let ziel = match registry.get(&req.room_id) {
            Some(raum) => raum.caller,
            None => return self.raum_fehlt(&req.room_id, connection_id, "answer"),
        };
        self.weiterleiten(ziel, ServerEvent::Answer { answer: req.answer });
    }

    /// `ice-candidate`: an die Gegenseite
    pub fn ice_candidate(&self, connection_id: ConnectionId, req: IceCandidateRequest) {
        let registry = self.registry.lock();
        let ziel = match registry.get(&req.room_id) {
            Some(raum) => raum.gegenueber(&connection_id),
            None => return self.raum_fehlt(&req.room_id, connection_id, "ice-candidate"),
        };
        self.weiterleiten(
            ziel,
            ServerEvent::IceCandidate {
                candidate: req.candidate,
            },
        );
    }

    /// `text-message`: an die Gegenseite, mit Absender
    ///
    /// Der Inhalt wird nicht inspiziert; ob er verschluesselt ist, entscheidet
    /// allein der Endpunkt.
    pub fn text_message(&self, connection_id: ConnectionId, req: TextMessageRequest) {
        let registry = self.registry.lock();
        let ziel = match registry.get(&req.room_id) {
            Some(raum) => raum.gegenueber(&connection_id),
            None => return self.raum_fehlt(&req.room_id, connection_id, "text-message"),
        };
        self.weiterleiten(
            ziel,
            ServerEvent::TextMessage {
                message: req.message,
                from: connection_id,
            },
        );
    }

    /// `hangup`: benachrichtigt die Gegenseite und loescht den Raum
    pub fn hangup(&self, connection_id: ConnectionId, req: HangupRequest) {
        let mut registry = self.registry.lock();
        let Some(raum) = registry.entfernen(&req.room_id) else {
            return self.raum_fehlt(&req.room_id, connection_id, "hangup");
        };

        if let Some(andere) = raum.gegenueber(&connection_id) {
            if andere != connection_id {
                self.zustellen(&andere, ServerEvent::Hangup);
            }
        }
        self.metriken.raum_geschlossen("hangup");
        self.gauge_aktualisieren(&registry);
        tracing::info!(room_id = %req.room_id, connection_id = %connection_id, "Aufgelegt");
    }

    // -----------------------------------------------------------------------
    // TTL
    // -----------------------------------------------------------------------

    /// Loescht nicht aktive Raeume die aelter als `ttl` sind
    ///
    /// Verbliebene Teilnehmer erhalten `error{room-expired}`. Gibt die Anzahl
    /// geloeschter Raeume zurueck.
    pub fn abgelaufene_entfernen(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let grenze = Utc::now() - ttl;

        let mut registry = self.registry.lock();
        let abgelaufen = registry.abgelaufene(grenze);
        for room_id in &abgelaufen {
            let Some(raum) = registry.entfernen(room_id) else {
                continue;
            };
            for teilnehmer in raum.teilnehmer() {
                self.zustellen(&teilnehmer, ServerEvent::error(FEHLER_RAUM_ABGELAUFEN));
            }
            self.metriken.raum_geschlossen("expired");
            tracing::info!(room_id = %room_id, "Raum abgelaufen");
        }
        self.gauge_aktualisieren(&registry);
        abgelaufen.len()
    }

    // -----------------------------------------------------------------------
    // Hilfsfunktionen
    // -----------------------------------------------------------------------

    /// Prueft die Rollen-Politik vor dem Setzen einer Rolle
    fn rolle_pruefen(
        &self,
        registry: &RoomRegistry,
        room_id: &RoomId,
        rolle: Rolle,
        connection_id: ConnectionId,
    ) -> SignalingResult<()> {
        if self.politik != RollenPolitik::Exklusiv {
            return Ok(());
        }
        let inhaber = registry.get(room_id).and_then(|raum| raum.belegung(rolle));
        match inhaber {
            Some(inhaber)
                if inhaber != connection_id && self.broadcaster.ist_registriert(&inhaber) =>
            {
                Err(SignalingError::RolleBelegt(room_id.clone()))
            }
            _ => Ok(()),
        }
    }

    fn weiterleiten(&self, ziel: Option<ConnectionId>, ereignis: ServerEvent) {
        match ziel {
            Some(ziel) => {
                self.zustellen(&ziel, ereignis);
            }
            None => {
                tracing::debug!(event = ereignis.name(), "Rolle leer – Ereignis verworfen");
                self.metriken.verworfen(GRUND_ROLLE_LEER);
            }
        }
    }

    fn zustellen(&self, ziel: &ConnectionId, ereignis: ServerEvent) -> Zustellung {
        let ergebnis = self.broadcaster.an_verbindung_senden(ziel, ereignis);
        match ergebnis {
            Zustellung::Eingereiht => self.metriken.messages_forwarded_total.inc(),
            Zustellung::QueueVoll => self.metriken.verworfen(GRUND_QUEUE_VOLL),
            Zustellung::Getrennt => self.metriken.verworfen(GRUND_GETRENNT),
        }
        ergebnis
    }

    fn raum_fehlt(&self, room_id: &RoomId, connection_id: ConnectionId, event: &'static str) {
        tracing::debug!(
            room_id = %room_id,
            connection_id = %connection_id,
            event,
            "Unbekannter Raum – Ereignis verworfen"
        );
        self.metriken.verworfen(GRUND_RAUM_FEHLT);
    }

    fn gauge_aktualisieren(&self, registry: &RoomRegistry) {
        self.metriken.rooms_active.set(registry.anzahl() as i64);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
