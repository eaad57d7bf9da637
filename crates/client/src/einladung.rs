//! Einladungslink – Raum-ID und Seed aus dem Link lesen
//!
//! Format: `{basis_url}/join?roomId=<uuid>&seed=<url-safe-base64>`

use duett_core::RoomId;
use duett_crypto::{derive_key, SymmetricKey};
use duett_protocol::LinkResponse;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Raum-ID und geteiltes Geheimnis eines Anrufs
#[derive(Clone, PartialEq, Eq)]
pub struct Einladung {
    pub room_id: RoomId,
    pub seed: String,
}

impl Einladung {
    pub fn neu(room_id: RoomId, seed: impl Into<String>) -> Self {
        Self {
            room_id,
            seed: seed.into(),
        }
    }

    /// Liest `roomId` und `seed` aus dem Query-String eines Links
    pub fn aus_link(link: &str) -> ClientResult<Self> {
        let url = Url::parse(link).map_err(|e| ClientError::UngueltigerLink(e.to_string()))?;

        let mut room_id = None;
        let mut seed = None;
        for (schluessel, wert) in url.query_pairs() {
            match schluessel.as_ref() {
                "roomId" => room_id = Some(wert.into_owned()),
                "seed" => seed = Some(wert.into_owned()),
                _ => {}
            }
        }

        let room_id = room_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::UngueltigerLink("roomId fehlt".into()))?;
        let seed = seed
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClientError::UngueltigerLink("seed fehlt".into()))?;

        Ok(Self::neu(RoomId::from(room_id), seed))
    }

    /// Leitet den Sitzungsschluessel aus dem Seed ab
    pub fn schluessel(&self) -> ClientResult<SymmetricKey> {
        Ok(derive_key(&self.seed)?)
    }
}

impl From<LinkResponse> for Einladung {
    fn from(antwort: LinkResponse) -> Self {
        Self::neu(antwort.room_id, antwort.seed)
    }
}

impl std::fmt::Debug for Einladung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Einladung")
            .field("room_id", &self.room_id)
            .field("seed", &"[REDACTED]")
            .finish()
    }
}
