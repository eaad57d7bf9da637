//! Authentifizierte Verschluesselung (XChaCha20-Poly1305)
//!
//! Pro Nachricht wird eine frische 192-Bit-Zufallsnonce gezogen, eine Nonce
//! wird unter demselben Schluessel nie wiederverwendet.
//!
//! ## Format
//! ```text
//! Envelope { nonce(24), ciphertext + auth_tag(16) }
//! ```

use chacha20poly1305::{aead::Aead, Key, KeyInit, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Envelope, SymmetricKey, NONCE_LAENGE};

/// Verschluesselt beliebige Bytes unter dem Sitzungsschluessel
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Envelope> {
    let mut nonce = [0u8; NONCE_LAENGE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(Envelope { nonce, ciphertext })
}

/// Entschluesselt und verifiziert einen Envelope
///
/// Bei ungueltigem Auth-Tag wird `CryptoError::Entschluesselung` geliefert,
/// niemals ein teilweise wiederhergestellter Klartext.
pub fn decrypt(envelope: &Envelope, key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            XNonce::from_slice(&envelope.nonce),
            envelope.ciphertext.as_slice(),
        )
        .map_err(|_| CryptoError::Entschluesselung)
}

/// Verschluesselt eine UTF-8-Textnachricht
pub fn encrypt_text(text: &str, key: &SymmetricKey) -> CryptoResult<Envelope> {
    encrypt(text.as_bytes(), key)
}

/// Entschluesselt eine Textnachricht
///
/// Ungueltiges UTF-8 nach erfolgreicher Verifikation gilt ebenfalls als
/// Entschluesselungsfehler.
pub fn decrypt_text(envelope: &Envelope, key: &SymmetricKey) -> CryptoResult<String> {
    let bytes = decrypt(envelope, key)?;
    String::from_utf8(bytes).map_err(|_| CryptoError::Entschluesselung)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
