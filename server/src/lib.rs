//! duett-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod sweeper;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::Router;
use config::ServerConfig;
use duett_observability::{
    health_router, metrics_router, request_timing_layer, timing_middleware, DuettMetrics,
    HealthState,
};
use duett_signaling::{signaling_router, SignalingState};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    state: Arc<SignalingState>,
    health: HealthState,
    metriken: DuettMetrics,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Result<Self> {
        let metriken = DuettMetrics::neu()?;
        let state = SignalingState::neu(config.signaling_config(), metriken.clone());
        let health = HealthState::neu(metriken.clone());
        Ok(Self {
            config,
            state,
            health,
            metriken,
        })
    }

    /// Gemeinsamer Signaling-Zustand (fuer Tests und Einbettung)
    pub fn state(&self) -> &Arc<SignalingState> {
        &self.state
    }

    /// Baut den vollstaendigen Router
    ///
    /// `/api/call/generate`, `/ws`, `/health`, `/metrics` plus Timing-,
    /// Trace- und CORS-Layer.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(signaling_router(Arc::clone(&self.state)))
            .merge(health_router(self.health.clone()))
            .merge(metrics_router(self.metriken.clone()))
            .layer(axum::middleware::from_fn_with_state(
                self.metriken.clone(),
                timing_middleware,
            ))
            .layer(request_timing_layer())
            .layer(cors_layer(&self.config.netzwerk.cors_origins))
    }

    /// Startet den Server auf der konfigurierten Adresse und laeuft bis
    /// Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse).await?;
        self.bedienen(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
            }
        })
        .await
    }

    /// Bedient Anfragen auf einem bereits gebundenen Listener bis `shutdown`
    /// abschliesst
    ///
    /// Reihenfolge beim Herunterfahren:
    /// 1. Health meldet `shutting_down`
    /// 2. Alle Verbindungs-Tasks erhalten das Shutdown-Signal
    /// 3. Sweeper endet, Listener wird geschlossen
    pub async fn bedienen<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let lokale_adresse = listener.local_addr()?;
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %lokale_adresse,
            link_basis = %self.config.link.basis_url,
            rollen_politik = ?self.state.relay.politik(),
            "Server startet"
        );

        let sweeper = self.config.raum_ttl().map(|ttl| {
            sweeper::starten(
                Arc::clone(&self.state.relay),
                ttl,
                self.config.sweep_intervall(),
                self.state.shutdown_abonnieren(),
            )
        });

        let app = self.router();
        let state = Arc::clone(&self.state);
        let health = self.health.clone();

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            health.herunterfahren_markieren();
            state.herunterfahren();
        })
        .await?;

        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }
        tracing::info!("Server beendet");
        Ok(())
    }
}

/// CORS: konfigurierte Origins oder permissiv wenn leer
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}
