//! Schluesselableitung aus dem Seed
//!
//! `key = SHA-512(seed_bytes)[0..32]`
//!
//! Rein und deterministisch: beide Endpunkte erhalten aus demselben Seed
//! denselben Schluessel, ohne Netzwerk-Roundtrip.

use sha2::{Digest, Sha512};

use crate::error::CryptoResult;
use crate::seed::seed_dekodieren;
use crate::types::{SymmetricKey, SCHLUESSEL_LAENGE};

/// Leitet den symmetrischen Schluessel aus dem URL-safe kodierten Seed ab
pub fn derive_key(seed: &str) -> CryptoResult<SymmetricKey> {
    let seed_bytes = seed_dekodieren(seed)?;
    let key = derive_key_from_bytes(&seed_bytes);
    tracing::debug!("Schluessel aus Seed abgeleitet");
    Ok(key)
}

/// Leitet den symmetrischen Schluessel aus rohen Seed-Bytes ab
pub fn derive_key_from_bytes(seed_bytes: &[u8]) -> SymmetricKey {
    let digest = Sha512::digest(seed_bytes);
    let mut key = [0u8; SCHLUESSEL_LAENGE];
    key.copy_from_slice(&digest[..SCHLUESSEL_LAENGE]);
    SymmetricKey::new(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use crate::seed::{seed_kodieren, Seed};

    #[test]
    fn ableitung_ist_deterministisch() {
        let seed = Seed::generieren().kodieren();
        let a = derive_key(&seed).unwrap();
        let b = derive_key(&seed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn verschiedene_seeds_verschiedene_schluessel() {
        let a = derive_key(&Seed::generieren().kodieren()).unwrap();
        let b = derive_key(&Seed::generieren().kodieren()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn schluessel_ist_praefix_von_sha512() {
        // SHA-512("abc"), erste 32 Bytes
        let erwartet: [u8; 32] = [
            0xdd, 0xaf, 0x35, 0xa1, 0x93, 0x61, 0x7a, 0xba, 0xcc, 0x41, 0x73, 0x49, 0xae, 0x20,
            0x41, 0x31, 0x12, 0xe6, 0xfa, 0x4e, 0x89, 0xa9, 0x7e, 0xa2, 0x0a, 0x9e, 0xee, 0xe6,
            0x4b, 0x55, 0xd3, 0x9a,
        ];
        let key = derive_key(&seed_kodieren(b"abc")).unwrap();
        assert_eq!(key.as_bytes(), &erwartet);
    }

    #[test]
    fn text_und_bytes_pfad_identisch() {
        let seed = Seed::generieren();
        let aus_text = derive_key(&seed.kodieren()).unwrap();
        let aus_bytes = derive_key_from_bytes(seed.as_bytes());
        assert_eq!(aus_text, aus_bytes);
    }

    #[test]
    fn ungueltiger_seed_liefert_seed_fehler() {
        assert!(matches!(
            derive_key("%%%"),
            Err(CryptoError::SeedDekodierung(_))
        ));
        assert!(matches!(derive_key(""), Err(CryptoError::SeedDekodierung(_))));
    }
}
