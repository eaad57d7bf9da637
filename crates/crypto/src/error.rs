//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
///
/// Alle Varianten schlagen geschlossen fehl: es werden nie Teildaten
/// zurueckgegeben.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Seed ist kein gueltiges URL-safe Base64 oder dekodiert zu 0 Bytes
    #[error("Seed-Dekodierung fehlgeschlagen: {0}")]
    SeedDekodierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Auth-Tag ungueltig (falscher Schluessel oder manipulierte Daten)
    #[error("Entschluesselung fehlgeschlagen: Schluessel falsch oder Daten manipuliert")]
    Entschluesselung,

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
