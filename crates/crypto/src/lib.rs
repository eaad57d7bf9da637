//! # duett-crypto
//!
//! Kryptografie der Endpunkte. Das Relay nutzt dieses Crate nie, es
//! forwardet Nutzdaten blind.
//!
//! ## Ablauf
//! 1. Der Link-Aussteller erzeugt einen `Seed` (32 Zufallsbytes, URL-safe Base64)
//! 2. Der Seed reist nur im Einladungslink, nie ueber den Ereigniskanal
//! 3. Beide Endpunkte leiten daraus per `derive_key` denselben Schluessel ab
//! 4. Textnachrichten werden mit XChaCha20-Poly1305 verschluesselt (`encrypt`)
//!
//! ## Module
//! - `seed` - Erzeugung und Kodierung des geteilten Geheimnisses
//! - `kdf` - Schluesselableitung (SHA-512, erste 32 Bytes)
//! - `channel` - AEAD-Verschluesselung mit 192-Bit-Nonce
//! - `identity` - Ed25519 Schluessel-Paare (nicht Teil des Relay-Ablaufs)
//! - `types` - Gemeinsame Typen (SymmetricKey, Envelope)
//! - `error` - Fehlertypen

pub mod channel;
pub mod error;
pub mod identity;
pub mod kdf;
pub mod seed;
pub mod types;

// Bequeme Re-Exports
pub use channel::{decrypt, decrypt_text, encrypt, encrypt_text};
pub use error::{CryptoError, CryptoResult};
pub use identity::{generate_key_pair, Identity, KeyPairText};
pub use kdf::{derive_key, derive_key_from_bytes};
pub use seed::{seed_dekodieren, seed_kodieren, Seed};
pub use types::{Envelope, SymmetricKey, NONCE_LAENGE, SCHLUESSEL_LAENGE, SEED_LAENGE};
