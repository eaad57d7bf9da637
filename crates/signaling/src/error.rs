//! Fehlertypen fuer den Signaling-Service

use duett_core::RoomId;
use duett_protocol::signal::{FEHLER_RAUM_NICHT_GEFUNDEN, FEHLER_ROLLE_BELEGT};
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
///
/// Relay-Fehler verlassen eine Verbindung nur als `error`-Ereignis, siehe
/// [`SignalingError::wire_message`].
#[derive(Debug, Error)]
pub enum SignalingError {
    /// `callee-join` auf einen unbekannten Raum
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(RoomId),

    /// Rolle ist von einer anderen, verbundenen Verbindung belegt
    #[error("Rolle in Raum {0} bereits belegt")]
    RolleBelegt(RoomId),

    /// Ereignis konnte nicht dekodiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Senden an die Verbindung fehlgeschlagen
    #[error("Senden fehlgeschlagen")]
    SendFehler,
}

impl SignalingError {
    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Fehlermeldung im `error`-Ereignis, falls der Fehler dem Endpunkt
    /// gemeldet wird
    pub fn wire_message(&self) -> Option<&'static str> {
        match self {
            Self::RaumNichtGefunden(_) => Some(FEHLER_RAUM_NICHT_GEFUNDEN),
            Self::RolleBelegt(_) => Some(FEHLER_ROLLE_BELEGT),
            Self::Protokoll(_) | Self::SendFehler => None,
        }
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_message_nur_fuer_gemeldete_fehler() {
        let raum = RoomId::from("r1");
        assert_eq!(
            SignalingError::RaumNichtGefunden(raum.clone()).wire_message(),
            Some("room-not-found")
        );
        assert_eq!(
            SignalingError::RolleBelegt(raum).wire_message(),
            Some("role-taken")
        );
        assert_eq!(SignalingError::protokoll("x").wire_message(), None);
    }
}
