//! Geteiltes Geheimnis (Seed) des Einladungslinks
//!
//! Der Seed besteht aus 32 Zufallsbytes aus dem OS-CSPRNG und wird
//! URL-safe Base64 ohne Padding kodiert, damit er ohne Prozent-Kodierung in
//! einem Query-Parameter stehen kann. Beim Dekodieren wird Padding
//! toleriert (aeltere Links enthalten `=`).

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SEED_LAENGE;

/// URL-safe Alphabet, kodiert ohne Padding, dekodiert mit oder ohne
const URL_SAFE_TOLERANT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Frisch erzeugter Seed (wird beim Drop genullt)
pub struct Seed([u8; SEED_LAENGE]);

impl Seed {
    /// Erzeugt einen neuen Seed aus dem OS-Zufallsgenerator
    pub fn generieren() -> Self {
        let mut bytes = [0u8; SEED_LAENGE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LAENGE] {
        &self.0
    }

    /// URL-safe Textform fuer den Einladungslink
    pub fn kodieren(&self) -> String {
        seed_kodieren(&self.0)
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seed([REDACTED])")
    }
}

/// Kodiert Seed-Bytes als URL-safe Base64 ohne Padding
pub fn seed_kodieren(bytes: &[u8]) -> String {
    URL_SAFE_TOLERANT.encode(bytes)
}

/// Dekodiert einen Seed aus dem Link zurueck in Bytes
///
/// Schlaegt fehl wenn der Text kein gueltiges URL-safe Base64 ist oder zu
/// null Bytes dekodiert.
pub fn seed_dekodieren(text: &str) -> CryptoResult<Vec<u8>> {
    let bytes = URL_SAFE_TOLERANT
        .decode(text.trim())
        .map_err(|e| CryptoError::SeedDekodierung(e.to_string()))?;
    if bytes.is_empty() {
        return Err(CryptoError::SeedDekodierung("Seed ist leer".to_string()));
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
