//! Link-Ausgabe – Erzeugt Raum-ID, Seed und Einladungslink
//!
//! Der Raum wird sofort leer in der Registry angelegt, damit ein
//! `callee-join` auch dann gelingt, wenn der Angerufene vor dem Anrufer
//! verbindet.

use duett_core::RoomId;
use duett_crypto::Seed;
use duett_protocol::LinkResponse;
use std::sync::Arc;

use crate::relay::SignalingRelay;

/// Stellt Einladungslinks aus
#[derive(Clone)]
pub struct LinkIssuer {
    relay: Arc<SignalingRelay>,
    basis_url: String,
}

impl LinkIssuer {
    /// Erstellt einen neuen LinkIssuer
    ///
    /// Ein abschliessender `/` in `basis_url` wird entfernt.
    pub fn neu(relay: Arc<SignalingRelay>, basis_url: impl Into<String>) -> Self {
        let basis_url = basis_url.into().trim_end_matches('/').to_string();
        Self { relay, basis_url }
    }

    /// Erzeugt einen frischen Raum und gibt Raum-ID, Seed und Link zurueck
    pub fn ausstellen(&self) -> LinkResponse {
        let seed = Seed::generieren().kodieren();
        let room_id = loop {
            let kandidat = RoomId::generieren();
            if self.relay.raum_vorregistrieren(kandidat.clone(), &seed) {
                break kandidat;
            }
            tracing::warn!(room_id = %kandidat, "Raum-ID bereits vergeben – neuer Versuch");
        };

        let link = format!(
            "{}/join?roomId={}&seed={}",
            self.basis_url, room_id, seed
        );
        self.relay.metriken().links_issued_total.inc();
        tracing::info!(room_id = %room_id, "Einladungslink ausgestellt");

        LinkResponse {
            room_id,
            seed,
            link,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RaumZustand;
    use crate::relay::RollenPolitik;
    use duett_crypto::seed_dekodieren;
    use duett_observability::DuettMetrics;
    use std::collections::HashSet;

    fn issuer(basis: &str) -> (LinkIssuer, Arc<SignalingRelay>) {
        let relay = Arc::new(SignalingRelay::neu(
            RollenPolitik::default(),
            DuettMetrics::neu().unwrap(),
        ));
        (LinkIssuer::neu(Arc::clone(&relay), basis), relay)
    }

    #[test]
    fn ausstellen_registriert_leeren_raum() {
        let (issuer, relay) = issuer("http://localhost:3000");
        let antwort = issuer.ausstellen();

        let raum = relay.raum(&antwort.room_id).unwrap();
        assert_eq!(raum.zustand(), RaumZustand::Leer);
        assert_eq!(raum.seed, antwort.seed);
        assert_eq!(relay.metriken().links_issued_total.get(), 1);
    }

    #[test]
    fn link_format() {
        let (issuer, _) = issuer("https://duett.example/");
        let antwort = issuer.ausstellen();
        assert_eq!(
            antwort.link,
            format!(
                "https://duett.example/join?roomId={}&seed={}",
                antwort.room_id, antwort.seed
            )
        );
        assert_eq!(seed_dekodieren(&antwort.seed).unwrap().len(), 32);
        assert!(uuid::Uuid::parse_str(antwort.room_id.as_str()).is_ok());
    }

    #[test]
    fn ids_und_seeds_paarweise_verschieden() {
        let (issuer, relay) = issuer("http://localhost:3000");
        let mut ids = HashSet::new();
        let mut seeds = HashSet::new();
        for _ in 0..2000 {
            let antwort = issuer.ausstellen();
            ids.insert(antwort.room_id);
            seeds.insert(antwort.seed);
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(seeds.len(), 2000);
        assert_eq!(relay.raum_anzahl(), 2000);
    }
}
