//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Laenge des symmetrischen Schluessels (XChaCha20-Poly1305)
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Laenge der Nonce (192 Bit)
pub const NONCE_LAENGE: usize = 24;

/// Laenge eines frisch erzeugten Seeds (256 Bit)
pub const SEED_LAENGE: usize = 32;

/// Symmetrischer Schluessel (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; SCHLUESSEL_LAENGE]);

impl SymmetricKey {
    pub fn new(bytes: [u8; SCHLUESSEL_LAENGE]) -> Self {
        Self(bytes)
    }

    /// Erstellt einen Schluessel aus einem Slice beliebiger Laenge
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SCHLUESSEL_LAENGE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
                    erwartet: SCHLUESSEL_LAENGE,
                    erhalten: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SCHLUESSEL_LAENGE] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED] {} bytes)", self.0.len())
    }
}

/// Verschluesselte Nachricht: Nonce + Ciphertext (inkl. 16 Bytes Auth-Tag)
///
/// Auf dem Draht als JSON `{"nonce": "<base64>", "ciphertext": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeText", into = "EnvelopeText")]
pub struct Envelope {
    pub nonce: [u8; NONCE_LAENGE],
    pub ciphertext: Vec<u8>,
}

/// Textkodierte Form des `Envelope` (Standard-Base64)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeText {
    pub nonce: String,
    pub ciphertext: String,
}

impl TryFrom<EnvelopeText> for Envelope {
    type Error = CryptoError;

    fn try_from(text: EnvelopeText) -> CryptoResult<Self> {
        let nonce_bytes = STANDARD.decode(text.nonce.as_bytes())?;
        let nonce: [u8; NONCE_LAENGE] =
            nonce_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::UngueltigeNonce {
                    erwartet: NONCE_LAENGE,
                    erhalten: nonce_bytes.len(),
                })?;
        let ciphertext = STANDARD.decode(text.ciphertext.as_bytes())?;
        Ok(Self { nonce, ciphertext })
    }
}

impl From<Envelope> for EnvelopeText {
    fn from(envelope: Envelope) -> Self {
        Self {
            nonce: STANDARD.encode(envelope.nonce),
            ciphertext: STANDARD.encode(&envelope.ciphertext),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
