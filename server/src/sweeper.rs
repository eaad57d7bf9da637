//! Raum-Sweeper – Entfernt periodisch abgelaufene, nicht aktive Raeume
//!
//! Laeuft nur wenn `[raeume] ttl_sek` groesser 0 ist.

use duett_signaling::SignalingRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Startet den periodischen Sweeper-Task
///
/// Der Task endet mit dem Shutdown-Signal.
pub fn starten(
    relay: Arc<SignalingRelay>,
    ttl: Duration,
    intervall: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tracing::info!(
        ttl_sek = ttl.as_secs(),
        intervall_sek = intervall.as_secs(),
        "Raum-Sweeper gestartet"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(intervall);
        ticker.tick().await; // Ersten Tick ueberspringen

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let entfernt = relay.abgelaufene_entfernen(ttl);
                    if entfernt > 0 {
                        tracing::info!(raeume = entfernt, "Abgelaufene Raeume entfernt");
                    }
                }
                ergebnis = shutdown_rx.changed() => {
                    if ergebnis.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Raum-Sweeper beendet");
    })
}
