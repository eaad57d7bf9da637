//! Ereigniskanal (WebSocket)
//!
//! Definiert alle Ereignisse zwischen Endpunkt und Relay.
//!
//! ## Design
//! - Ein JSON-Textframe pro Ereignis: `{"event": "<name>", "data": {...}}`
//! - `data` entfaellt bei Ereignissen ohne Nutzdaten (`caller-ready`, `hangup`, ...)
//! - Feldnamen in camelCase
//! - SDP, ICE-Kandidaten und Textnachrichten sind opake JSON-Werte, das Relay
//!   prueft ihre Struktur nie

use duett_core::{ConnectionId, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fehlermeldung bei `callee-join` auf einen unbekannten Raum
pub const FEHLER_RAUM_NICHT_GEFUNDEN: &str = "room-not-found";

/// Fehlermeldung wenn die Rolle bereits von einer anderen, verbundenen
/// Verbindung belegt ist (nur bei exklusiver Rollen-Politik)
pub const FEHLER_ROLLE_BELEGT: &str = "role-taken";

/// Fehlermeldung an einen verbliebenen Teilnehmer bei TTL-Ablauf
pub const FEHLER_RAUM_ABGELAUFEN: &str = "room-expired";

// ---------------------------------------------------------------------------
// Endpunkt -> Relay
// ---------------------------------------------------------------------------

/// Anrufer betritt den Raum (legt ihn bei Bedarf an)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerJoinRequest {
    pub room_id: RoomId,
    pub seed: String,
}

/// Angerufener betritt einen bestehenden Raum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalleeJoinRequest {
    pub room_id: RoomId,
    /// Wird von manchen Clients mitgeschickt und vom Relay ignoriert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// SDP-Offer des Anrufers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub room_id: RoomId,
    pub offer: Value,
}

/// SDP-Answer des Angerufenen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub room_id: RoomId,
    pub answer: Value,
}

/// ICE-Kandidat an die Gegenseite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateRequest {
    pub room_id: RoomId,
    pub candidate: Value,
}

/// Textnachricht an die Gegenseite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageRequest {
    pub room_id: RoomId,
    pub message: Value,
}

/// Anruf beenden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HangupRequest {
    pub room_id: RoomId,
}

/// Alle Ereignisse die ein Endpunkt an das Relay sendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    CallerJoin(CallerJoinRequest),
    CalleeJoin(CalleeJoinRequest),
    Offer(OfferRequest),
    Answer(AnswerRequest),
    IceCandidate(IceCandidateRequest),
    TextMessage(TextMessageRequest),
    Hangup(HangupRequest),
}

impl ClientEvent {
    /// Raum-ID auf die sich das Ereignis bezieht
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::CallerJoin(r) => &r.room_id,
            Self::CalleeJoin(r) => &r.room_id,
            Self::Offer(r) => &r.room_id,
            Self::Answer(r) => &r.room_id,
            Self::IceCandidate(r) => &r.room_id,
            Self::TextMessage(r) => &r.room_id,
            Self::Hangup(r) => &r.room_id,
        }
    }

    /// Ereignisname auf dem Draht (fuer Logging)
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallerJoin(_) => "caller-join",
            Self::CalleeJoin(_) => "callee-join",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::TextMessage(_) => "text-message",
            Self::Hangup(_) => "hangup",
        }
    }

    /// Serialisiert das Ereignis als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Ereignis aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Relay -> Endpunkt
// ---------------------------------------------------------------------------

/// Alle Ereignisse die das Relay an einen Endpunkt sendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Bestaetigung fuer den Anrufer
    CallerReady,
    /// Bestaetigung fuer den Angerufenen
    CalleeReady,
    /// Anrufer wird ueber den Beitritt des Angerufenen informiert
    CalleeJoined,
    Offer { offer: Value },
    Answer { answer: Value },
    IceCandidate { candidate: Value },
    TextMessage { message: Value, from: ConnectionId },
    /// Gegenseite hat aufgelegt
    Hangup,
    /// Transportverbindung der Gegenseite ist weg
    PeerDisconnected,
    Error { message: String },
}

impl ServerEvent {
    /// Erstellt ein Fehler-Ereignis
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Ereignisname auf dem Draht (fuer Logging)
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallerReady => "caller-ready",
            Self::CalleeReady => "callee-ready",
            Self::CalleeJoined => "callee-joined",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::TextMessage { .. } => "text-message",
            Self::Hangup => "hangup",
            Self::PeerDisconnected => "peer-disconnected",
            Self::Error { .. } => "error",
        }
    }

    /// Serialisiert das Ereignis als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Ereignis aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn caller_join_drahtformat() {
        let json = r#"{"event":"caller-join","data":{"roomId":"r1","seed":"c2VlZA"}}"#;
        let ev = ClientEvent::from_json(json).unwrap();
        match ev {
            ClientEvent::CallerJoin(req) => {
                assert_eq!(req.room_id.as_str(), "r1");
                assert_eq!(req.seed, "c2VlZA");
            }
            other => panic!("Erwartet CallerJoin, erhalten {other:?}"),
        }
    }

    #[test]
    fn callee_join_mit_und_ohne_seed() {
        let ohne = ClientEvent::from_json(r#"{"event":"callee-join","data":{"roomId":"r1"}}"#)
            .unwrap();
        let mit = ClientEvent::from_json(
            r#"{"event":"callee-join","data":{"roomId":"r1","seed":"xyz"}}"#,
        )
        .unwrap();
        assert_eq!(ohne.room_id(), mit.room_id());
        assert_eq!(ohne.name(), "callee-join");
    }

    #[test]
    fn ice_candidate_name_ist_kebab_case() {
        let ev = ClientEvent::IceCandidate(IceCandidateRequest {
            room_id: RoomId::from("r"),
            candidate: json!({"candidate": "candidate:1 1 UDP 2122252543 10.0.0.1 5000 typ host"}),
        });
        let v: Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(v["event"], "ice-candidate");
        assert_eq!(v["data"]["roomId"], "r");
    }

    #[test]
    fn opake_payloads_bleiben_unveraendert() {
        let sdp = json!({"type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 127.0.0.1", "extra": [1, 2, 3]});
        let json = ClientEvent::Offer(OfferRequest {
            room_id: RoomId::from("r"),
            offer: sdp.clone(),
        })
        .to_json()
        .unwrap();
        match ClientEvent::from_json(&json).unwrap() {
            ClientEvent::Offer(req) => assert_eq!(req.offer, sdp),
            other => panic!("Erwartet Offer, erhalten {other:?}"),
        }
    }

    #[test]
    fn server_events_ohne_nutzdaten() {
        let v: Value = serde_json::from_str(&ServerEvent::CallerReady.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"event": "caller-ready"}));

        let v: Value =
            serde_json::from_str(&ServerEvent::PeerDisconnected.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"event": "peer-disconnected"}));

        assert_eq!(
            ServerEvent::from_json(r#"{"event":"hangup"}"#).unwrap(),
            ServerEvent::Hangup
        );
    }

    #[test]
    fn text_message_traegt_absender() {
        let from = ConnectionId::new();
        let ev = ServerEvent::TextMessage {
            message: json!("hallo"),
            from,
        };
        let v: Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(v["event"], "text-message");
        assert_eq!(v["data"]["message"], "hallo");
        assert_eq!(v["data"]["from"], from.to_string());
    }

    #[test]
    fn fehler_ereignis() {
        let v: Value = serde_json::from_str(
            &ServerEvent::error(FEHLER_RAUM_NICHT_GEFUNDEN).to_json().unwrap(),
        )
        .unwrap();
        assert_eq!(v, json!({"event": "error", "data": {"message": "room-not-found"}}));
    }

    #[test]
    fn unbekanntes_ereignis_schlaegt_fehl() {
        assert!(ClientEvent::from_json(r#"{"event":"join-all","data":{}}"#).is_err());
        assert!(ClientEvent::from_json("kein json").is_err());
    }
}
