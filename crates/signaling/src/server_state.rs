//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Relay, Link-Ausgabe und Shutdown-Signal als Arc-Referenzen, die
//! sicher zwischen tokio-Tasks und Axum-Handlern geteilt werden koennen.

use duett_observability::DuettMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::issuer::LinkIssuer;
use crate::relay::{RollenPolitik, SignalingRelay};

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Basis-URL der Einladungslinks
    pub link_basis_url: String,
    /// Verhalten beim Beitritt in eine belegte Rolle
    pub rollen_politik: RollenPolitik,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden (0 = kein Timeout)
    pub verbindungs_timeout_sek: u64,
}

impl SignalingConfig {
    /// Ping-Intervall (mindestens eine Sekunde)
    pub fn keepalive_intervall(&self) -> Duration {
        Duration::from_secs(self.keepalive_sek.max(1))
    }

    /// Inaktivitaets-Timeout, `None` wenn deaktiviert
    pub fn verbindungs_timeout(&self) -> Option<Duration> {
        (self.verbindungs_timeout_sek > 0)
            .then(|| Duration::from_secs(self.verbindungs_timeout_sek))
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            link_basis_url: "http://localhost:3000".to_string(),
            rollen_politik: RollenPolitik::default(),
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Service-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Protokoll-Zustandsmaschine samt Registry
    pub relay: Arc<SignalingRelay>,
    /// Einladungslinks
    pub issuer: LinkIssuer,
    /// Prometheus-Metriken
    pub metriken: DuettMetrics,
    shutdown_tx: watch::Sender<bool>,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig, metriken: DuettMetrics) -> Arc<Self> {
        let relay = Arc::new(SignalingRelay::neu(
            config.rollen_politik,
            metriken.clone(),
        ));
        let issuer = LinkIssuer::neu(Arc::clone(&relay), config.link_basis_url.clone());
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            config: Arc::new(config),
            relay,
            issuer,
            metriken,
            shutdown_tx,
        })
    }

    /// Neuer Empfaenger fuer das Shutdown-Signal
    pub fn shutdown_abonnieren(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signalisiert allen Verbindungs-Tasks das Herunterfahren
    pub fn herunterfahren(&self) {
        self.shutdown_tx.send_replace(true);
        tracing::info!("Shutdown-Signal an alle Verbindungen gesendet");
    }
}
