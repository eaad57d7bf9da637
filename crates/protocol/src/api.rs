//! HTTP-Antworttypen (Link-Ausgabe)

use duett_core::RoomId;
use serde::{Deserialize, Serialize};

/// Antwort von `POST /api/call/generate`
///
/// Enthaelt Raum-ID, Seed und den fertigen Einladungslink, der beide Werte
/// als Query-Parameter traegt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub room_id: RoomId,
    pub seed: String,
    pub link: String,
}
