//! Raum-Registry – Einziger Besitzer der Raum-Lebensdauer
//!
//! Haelt alle lebenden Raeume sowie einen Rueckwaerts-Index
//! Verbindung -> Raeume, damit das Aufraeumen beim Trennen nicht alle
//! Raeume durchsuchen muss.
//!
//! ## Invariante
//! Verbindung C steht genau dann unter Raum R im Index, wenn C Anrufer
//! oder Angerufener des lebenden Raums R ist.
//!
//! Die Registry selbst ist nicht synchronisiert; der `SignalingRelay` haelt
//! sie hinter einem einzigen Mutex.

use chrono::{DateTime, Utc};
use duett_core::{ConnectionId, RoomId};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Rollen und Zustaende
// ---------------------------------------------------------------------------

/// Rolle einer Verbindung in einem Raum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rolle {
    Anrufer,
    Angerufener,
}

/// Abgeleiteter Zustand eines lebenden Raums
///
/// ```text
/// Leer -> AnruferAnwesend -> BeideAnwesend -> (geloescht)
///   \-> AngerufenerAnwesend ---^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaumZustand {
    Leer,
    AnruferAnwesend,
    AngerufenerAnwesend,
    BeideAnwesend,
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Zustand eines einzelnen Raums
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    pub room_id: RoomId,
    /// Geteiltes Geheimnis aus dem Link; das Relay sendet es nie weiter
    pub seed: String,
    pub caller: Option<ConnectionId>,
    pub callee: Option<ConnectionId>,
    pub created_at: DateTime<Utc>,
}

impl RoomState {
    /// Erstellt einen leeren Raum
    pub fn neu(room_id: RoomId, seed: impl Into<String>) -> Self {
        Self {
            room_id,
            seed: seed.into(),
            caller: None,
            callee: None,
            created_at: Utc::now(),
        }
    }

    pub fn zustand(&self) -> RaumZustand {
        match (self.caller, self.callee) {
            (None, None) => RaumZustand::Leer,
            (Some(_), None) => RaumZustand::AnruferAnwesend,
            (None, Some(_)) => RaumZustand::AngerufenerAnwesend,
            (Some(_), Some(_)) => RaumZustand::BeideAnwesend,
        }
    }

    /// Beide Rollen belegt
    pub fn ist_aktiv(&self) -> bool {
        self.zustand() == RaumZustand::BeideAnwesend
    }

    pub fn belegung(&self, rolle: Rolle) -> Option<ConnectionId> {
        match rolle {
            Rolle::Anrufer => self.caller,
            Rolle::Angerufener => self.callee,
        }
    }

    /// Gegenseite des Absenders: Angerufener wenn der Absender Anrufer ist,
    /// sonst Anrufer
    pub fn gegenueber(&self, absender: &ConnectionId) -> Option<ConnectionId> {
        if self.caller.as_ref() == Some(absender) {
            self.callee
        } else {
            self.caller
        }
    }

    /// Alle belegten Rollen ohne Duplikate
    pub fn teilnehmer(&self) -> Vec<ConnectionId> {
        let mut teilnehmer: Vec<ConnectionId> = self.caller.into_iter().collect();
        if let Some(callee) = self.callee {
            if !teilnehmer.contains(&callee) {
                teilnehmer.push(callee);
            }
        }
        teilnehmer
    }

    fn haelt(&self, connection_id: &ConnectionId) -> bool {
        self.caller.as_ref() == Some(connection_id) || self.callee.as_ref() == Some(connection_id)
    }
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

/// roomId -> RoomState plus Rueckwaerts-Index
#[derive(Debug, Default)]
pub struct RoomRegistry {
    raeume: HashMap<RoomId, RoomState>,
    index: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt einen Raum ein
    ///
    /// Gibt `false` zurueck und aendert nichts, wenn die ID bereits lebt.
    pub fn registrieren(&mut self, raum: RoomState) -> bool {
        if self.raeume.contains_key(&raum.room_id) {
            return false;
        }
        for teilnehmer in raum.teilnehmer() {
            self.index
                .entry(teilnehmer)
                .or_default()
                .insert(raum.room_id.clone());
        }
        self.raeume.insert(raum.room_id.clone(), raum);
        true
    }

    pub fn enthaelt(&self, room_id: &RoomId) -> bool {
        self.raeume.contains_key(room_id)
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&RoomState> {
        self.raeume.get(room_id)
    }

    /// Setzt eine Rolle auf die Verbindung (letzter Schreiber gewinnt)
    ///
    /// Gibt `None` zurueck wenn der Raum nicht existiert, sonst den
    /// vorherigen Inhaber der Rolle.
    pub fn rolle_setzen(
        &mut self,
        room_id: &RoomId,
        rolle: Rolle,
        connection_id: ConnectionId,
    ) -> Option<Option<ConnectionId>> {
        let raum = self.raeume.get_mut(room_id)?;
        let slot = match rolle {
            Rolle::Anrufer => &mut raum.caller,
            Rolle::Angerufener => &mut raum.callee,
        };
        let vorher = slot.replace(connection_id);

        // Verdraengter Inhaber verliert den Index-Eintrag, ausser er haelt
        // noch die andere Rolle
        if let Some(alt) = vorher {
            if alt != connection_id && !raum.haelt(&alt) {
                Self::index_entfernen(&mut self.index, &alt, room_id);
            }
        }
        self.index
            .entry(connection_id)
            .or_default()
            .insert(room_id.clone());

        Some(vorher)
    }

    /// Loescht einen Raum samt Index-Eintraegen seiner Teilnehmer
    pub fn entfernen(&mut self, room_id: &RoomId) -> Option<RoomState> {
        let raum = self.raeume.remove(room_id)?;
        for teilnehmer in raum.teilnehmer() {
            Self::index_entfernen(&mut self.index, &teilnehmer, room_id);
        }
        Some(raum)
    }

    /// Alle Raeume in denen die Verbindung eine Rolle haelt
    pub fn raeume_von(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self
            .index
            .get(connection_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Nicht aktive Raeume die vor `grenze` angelegt wurden
    pub fn abgelaufene(&self, grenze: DateTime<Utc>) -> Vec<RoomId> {
        self.raeume
            .values()
            .filter(|raum| !raum.ist_aktiv() && raum.created_at <= grenze)
            .map(|raum| raum.room_id.clone())
            .collect()
    }

    /// Anzahl lebender Raeume
    pub fn anzahl(&self) -> usize {
        self.raeume.len()
    }

    /// Anzahl der Verbindungen mit mindestens einer Rolle
    pub fn indizierte_verbindungen(&self) -> usize {
        self.index.len()
    }

    fn index_entfernen(
        index: &mut HashMap<ConnectionId, HashSet<RoomId>>,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) {
        if let Some(ids) = index.get_mut(connection_id) {
            ids.remove(room_id);
            if ids.is_empty() {
                index.remove(connection_id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
