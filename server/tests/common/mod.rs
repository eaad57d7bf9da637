//! Gemeinsame Hilfen fuer die Server-Integrationstests

#![allow(dead_code)]

use duett_client::{ClientResult, SignalClient};
use duett_protocol::ServerEvent;
use duett_server::{config::ServerConfig, Server};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Obergrenze fuer jedes erwartete Ereignis
pub const WARTEZEIT: Duration = Duration::from_secs(5);

/// Laufender Testserver auf einem freien Port
pub struct TestServer {
    pub adresse: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn starten() -> Self {
        Self::mit_config(ServerConfig::default()).await
    }

    pub async fn mit_config(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let adresse = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = Server::neu(config).unwrap();
        let handle = tokio::spawn(server.bedienen(listener, async {
            let _ = shutdown_rx.await;
        }));

        Self {
            adresse,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.adresse)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.adresse)
    }

    pub async fn client(&self) -> SignalClient {
        SignalClient::verbinden(&self.ws_url()).await.unwrap()
    }

    /// Loest den Shutdown aus und wartet bis `bedienen` zurueckkehrt
    pub async fn beenden(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(WARTEZEIT, self.handle)
            .await
            .expect("Server beendet nicht rechtzeitig")
            .expect("Server-Task abgebrochen")
    }
}

/// Naechstes Ereignis mit Zeitlimit
pub async fn erwarten(client: &mut SignalClient) -> ClientResult<Option<ServerEvent>> {
    tokio::time::timeout(WARTEZEIT, client.naechstes_ereignis())
        .await
        .expect("Kein Ereignis innerhalb der Wartezeit")
}

/// Naechstes Ereignis, das vorhanden sein muss
pub async fn ereignis(client: &mut SignalClient) -> ServerEvent {
    erwarten(client)
        .await
        .unwrap()
        .expect("Verbindung unerwartet geschlossen")
}

/// Prueft dass innerhalb von `dauer` kein Ereignis eintrifft
pub async fn still(client: &mut SignalClient, dauer: Duration) {
    if let Ok(ergebnis) = tokio::time::timeout(dauer, client.naechstes_ereignis()).await {
        panic!("Unerwartetes Ereignis: {ergebnis:?}");
    }
}
