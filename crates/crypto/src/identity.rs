//! Ed25519 Schluessel-Paare
//!
//! Nicht Teil des Relay-Ablaufs: Raum-ID und Seed sind die einzige
//! Berechtigung. Fuer Anwendungen die Endpunkte zusaetzlich ueber eine
//! Signatur identifizieren wollen, stehen hier Erzeugung, Signierung und
//! Verifikation bereit.

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Ed25519-Identitaet eines Endpunkts
pub struct Identity {
    signing_key: SigningKey,
}

/// Schluessel-Paar in Textform (Standard-Base64)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairText {
    pub public_key: String,
    pub secret_key: String,
}

impl Identity {
    /// Generiert ein neues Ed25519-Schluessel-Paar
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Erstellt eine Identity aus einem privaten Schluessel (32 Bytes)
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signiert Daten mit dem privaten Schluessel (64-Byte-Signatur)
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_bytes().to_vec()
    }

    /// Verifiziert eine Signatur mit einem oeffentlichen Schluessel
    pub fn verify(data: &[u8], signature_bytes: &[u8], public_key_bytes: &[u8; 32]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(public_key_bytes) else {
            return false;
        };
        let Ok(sig_array) = signature_bytes.try_into() else {
            return false;
        };
        let signature = Signature::from_bytes(sig_array);
        verifying_key.verify(data, &signature).is_ok()
    }

    /// Exportiert das Schluessel-Paar Base64-kodiert
    pub fn to_text(&self) -> KeyPairText {
        KeyPairText {
            public_key: STANDARD.encode(self.public_key_bytes()),
            secret_key: STANDARD.encode(self.private_key_bytes()),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity {{ public_key: [Ed25519 VerifyingKey] }}")
    }
}

/// Erzeugt ein frisches Schluessel-Paar und gibt es in Textform zurueck
pub fn generate_key_pair() -> KeyPairText {
    Identity::generate().to_text()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
