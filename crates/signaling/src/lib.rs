//! duett-signaling – Raum-Registry und Signaling-Relay
//!
//! Dieser Crate vermittelt genau zwei Endpunkte pro Raum: er stellt
//! Einladungslinks aus, verwaltet die Raum-Lebensdauer und leitet
//! Session-Aushandlung (SDP, ICE) sowie opake Textnachrichten weiter.
//! Er entschluesselt nie etwas.
//!
//! ## Architektur
//!
//! ```text
//! Axum-Router (signaling_router)
//!     |
//!     +-- POST /api/call/generate -> LinkIssuer
//!     +-- GET  /ws                -> ClientConnection (pro Verbindung ein Task)
//!                                        |
//!                                        v
//!                                  SignalingRelay (ein Mutex ueber die Registry)
//!                                        |
//!                                        +-- RoomRegistry         (Raeume + Rueckwaerts-Index)
//!                                        +-- ConnectionBroadcaster (Send-Queues pro Verbindung)
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod issuer;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod server_state;

// Bequeme Re-Exporte
pub use broadcast::{ConnectionBroadcaster, Zustellung};
pub use connection::ClientConnection;
pub use error::{SignalingError, SignalingResult};
pub use issuer::LinkIssuer;
pub use registry::{RaumZustand, Rolle, RoomRegistry, RoomState};
pub use relay::{RollenPolitik, SignalingRelay};
pub use routes::signaling_router;
pub use server_state::{SignalingConfig, SignalingState};
