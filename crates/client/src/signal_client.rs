//! Client-seitiger Ereigniskanal zum Duett-Relay
//!
//! Eine WebSocket-Verbindung, ein JSON-Textframe pro Ereignis. Text-
//! nachrichten werden immer unter dem aus dem Seed abgeleiteten Schluessel
//! verschluesselt; das Relay sieht nur den Envelope.

use duett_core::RoomId;
use duett_crypto::{decrypt_text, encrypt_text, CryptoError, Envelope, SymmetricKey};
use duett_protocol::signal::{
    AnswerRequest, CallerJoinRequest, CalleeJoinRequest, HangupRequest, IceCandidateRequest,
    OfferRequest, TextMessageRequest,
};
use duett_protocol::{ClientEvent, LinkResponse, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::einladung::Einladung;
use crate::error::{ClientError, ClientResult};

/// Fordert beim Server einen neuen Einladungslink an
///
/// `api_basis` ist die HTTP-Basis des Servers, z.B. `http://localhost:3001`.
pub async fn link_anfordern(api_basis: &str) -> ClientResult<LinkResponse> {
    let url = format!("{}/api/call/generate", api_basis.trim_end_matches('/'));
    tracing::debug!(url = %url, "Fordere Einladungslink an");
    let antwort = reqwest::Client::new()
        .post(&url)
        .send()
        .await?
        .error_for_status()?
        .json::<LinkResponse>()
        .await?;
    Ok(antwort)
}

/// Aktiver Raum samt Sitzungsschluessel
struct Sitzung {
    room_id: RoomId,
    schluessel: SymmetricKey,
}

/// Verbindung eines Endpunkts zum Relay
pub struct SignalClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    sitzung: Option<Sitzung>,
}

impl SignalClient {
    /// Baut die WebSocket-Verbindung auf (`ws://host:port/ws`)
    pub async fn verbinden(ws_url: &str) -> ClientResult<Self> {
        tracing::info!("Verbinde mit {}", ws_url);
        let (ws, _) = connect_async(ws_url).await?;
        tracing::info!("WebSocket-Verbindung hergestellt zu {}", ws_url);
        Ok(Self { ws, sitzung: None })
    }

    /// Raum-ID nach `caller_join`/`callee_join`
    pub fn room_id(&self) -> Option<&RoomId> {
        self.sitzung.as_ref().map(|s| &s.room_id)
    }

    // -----------------------------------------------------------------------
    // Beitritt
    // -----------------------------------------------------------------------

    /// Tritt als Anrufer bei; legt den Raum beim Relay bei Bedarf an
    pub async fn caller_join(&mut self, einladung: &Einladung) -> ClientResult<()> {
        self.sitzung_setzen(einladung)?;
        self.senden(ClientEvent::CallerJoin(CallerJoinRequest {
            room_id: einladung.room_id.clone(),
            seed: einladung.seed.clone(),
        }))
        .await
    }

    /// Tritt als Angerufener bei; der Seed verlaesst den Endpunkt nicht
    pub async fn callee_join(&mut self, einladung: &Einladung) -> ClientResult<()> {
        self.sitzung_setzen(einladung)?;
        self.senden(ClientEvent::CalleeJoin(CalleeJoinRequest {
            room_id: einladung.room_id.clone(),
            seed: None,
        }))
        .await
    }

    // -----------------------------------------------------------------------
    // Session-Aushandlung
    // -----------------------------------------------------------------------

    pub async fn offer_senden(&mut self, offer: Value) -> ClientResult<()> {
        let room_id = self.aktiver_raum()?;
        self.senden(ClientEvent::Offer(OfferRequest { room_id, offer }))
            .await
    }

    pub async fn answer_senden(&mut self, answer: Value) -> ClientResult<()> {
        let room_id = self.aktiver_raum()?;
        self.senden(ClientEvent::Answer(AnswerRequest { room_id, answer }))
            .await
    }

    pub async fn ice_senden(&mut self, candidate: Value) -> ClientResult<()> {
        let room_id = self.aktiver_raum()?;
        self.senden(ClientEvent::IceCandidate(IceCandidateRequest {
            room_id,
            candidate,
        }))
        .await
    }

    // -----------------------------------------------------------------------
    // Textnachrichten
    // -----------------------------------------------------------------------

    /// Verschluesselt `text` und sendet den Envelope als `message`
    pub async fn text_senden(&mut self, text: &str) -> ClientResult<()> {
        let sitzung = self.sitzung.as_ref().ok_or(ClientError::KeinRaum)?;
        let envelope = encrypt_text(text, &sitzung.schluessel)?;
        let event = ClientEvent::TextMessage(TextMessageRequest {
            room_id: sitzung.room_id.clone(),
            message: serde_json::to_value(&envelope)?,
        });
        self.senden(event).await
    }

    /// Entschluesselt das `message`-Feld eines empfangenen `text-message`
    ///
    /// Manipulierte, fremde oder unlesbare Nachrichten liefern immer
    /// `CryptoError::Entschluesselung`, nie Klartext.
    pub fn text_entschluesseln(&self, message: &Value) -> ClientResult<String> {
        let sitzung = self.sitzung.as_ref().ok_or(ClientError::KeinRaum)?;
        let envelope: Envelope = serde_json::from_value(message.clone()).map_err(|e| {
            tracing::debug!(fehler = %e, "Envelope nicht lesbar");
            ClientError::Krypto(CryptoError::Entschluesselung)
        })?;
        decrypt_text(&envelope, &sitzung.schluessel).map_err(|e| {
            tracing::debug!(fehler = %e, "Nachricht nicht authentisch");
            ClientError::Krypto(CryptoError::Entschluesselung)
        })
    }

    // -----------------------------------------------------------------------
    // Beenden
    // -----------------------------------------------------------------------

    /// Legt auf; das Relay loescht den Raum
    pub async fn auflegen(&mut self) -> ClientResult<()> {
        let room_id = self.aktiver_raum()?;
        self.senden(ClientEvent::Hangup(HangupRequest { room_id }))
            .await?;
        self.sitzung = None;
        Ok(())
    }

    /// Schliesst die WebSocket-Verbindung
    pub async fn schliessen(mut self) -> ClientResult<()> {
        self.ws.close(None).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Empfang
    // -----------------------------------------------------------------------

    /// Wartet auf das naechste Ereignis vom Relay
    ///
    /// Gibt `None` zurueck wenn die Verbindung geschlossen wurde.
    /// Ping/Pong beantwortet tungstenite selbst.
    pub async fn naechstes_ereignis(&mut self) -> ClientResult<Option<ServerEvent>> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(ServerEvent::from_json(&text)?));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Hilfsfunktionen
    // -----------------------------------------------------------------------

    fn sitzung_setzen(&mut self, einladung: &Einladung) -> ClientResult<()> {
        self.sitzung = Some(Sitzung {
            room_id: einladung.room_id.clone(),
            schluessel: einladung.schluessel()?,
        });
        Ok(())
    }

    fn aktiver_raum(&self) -> ClientResult<RoomId> {
        self.room_id().cloned().ok_or(ClientError::KeinRaum)
    }

    async fn senden(&mut self, event: ClientEvent) -> ClientResult<()> {
        let json = event.to_json()?;
        tracing::trace!(event = event.name(), "Sende Ereignis");
        self.ws.send(Message::Text(json)).await?;
        Ok(())
    }
}
