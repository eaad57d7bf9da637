//! duett-client – Endpunkt-Bibliothek fuer Duett
//!
//! - [`Einladung`]: Raum-ID und Seed aus dem Einladungslink
//! - [`SignalClient`]: Ereigniskanal zum Relay, verschluesselt Text
//!   automatisch unter dem aus dem Seed abgeleiteten Schluessel
//! - [`link_anfordern`]: neuen Einladungslink beim Server erzeugen

pub mod einladung;
pub mod error;
pub mod signal_client;

pub use einladung::Einladung;
pub use error::{ClientError, ClientResult};
pub use signal_client::{link_anfordern, SignalClient};
