//! duett-core – Gemeinsame Typen
//!
//! Stellt die Identifikationstypen bereit, die von Protokoll, Signaling,
//! Server und Client gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{ConnectionId, RoomId};
