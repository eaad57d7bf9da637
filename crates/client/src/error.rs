//! Fehlertypen der Endpunkt-Bibliothek

use duett_crypto::CryptoError;
use thiserror::Error;

/// Fehler die beim Umgang mit Relay und Einladung auftreten koennen
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket-Verbindung fehlgeschlagen oder abgebrochen
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP-Anfrage an die Link-Ausgabe fehlgeschlagen
    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),

    /// Einladungslink ist keine gueltige URL oder unvollstaendig
    #[error("Ungueltiger Einladungslink: {0}")]
    UngueltigerLink(String),

    /// Schluesselableitung oder Entschluesselung fehlgeschlagen
    #[error("Kryptografie-Fehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Ereignis konnte nicht (de)serialisiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] serde_json::Error),

    /// Operation benoetigt einen vorherigen `caller_join`/`callee_join`
    #[error("Kein Raum betreten")]
    KeinRaum,
}

impl ClientError {
    /// `true` wenn eine empfangene Nachricht nicht authentisch war
    pub fn ist_entschluesselungsfehler(&self) -> bool {
        matches!(self, Self::Krypto(CryptoError::Entschluesselung))
    }
}

/// Result-Typ der Endpunkt-Bibliothek
pub type ClientResult<T> = Result<T, ClientError>;
