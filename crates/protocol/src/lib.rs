//! duett-protocol – Nachrichtentypen des Ereigniskanals
//!
//! Definiert alle Ereignisse die ueber den WebSocket zwischen Endpunkt und
//! Relay ausgetauscht werden, sowie die Antwort der Link-Ausgabe.

pub mod api;
pub mod signal;

pub use api::LinkResponse;
pub use signal::{ClientEvent, ServerEvent};
