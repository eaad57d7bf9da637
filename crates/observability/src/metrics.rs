//! Prometheus-kompatible Metriken fuer Duett
//!
//! Registrierte Metriken:
//! - `duett_connections_active` – Gauge: Offene Event-Kanal-Verbindungen
//! - `duett_rooms_active` – Gauge: Lebende Raeume in der Registry
//! - `duett_links_issued_total` – Counter: Ausgegebene Einladungslinks
//! - `duett_signal_events_total` – Counter: Eingehende Ereignisse (event)
//! - `duett_messages_forwarded_total` – Counter: Zugestellte Relay-Ereignisse
//! - `duett_messages_dropped_total` – Counter: Verworfene Ereignisse (reason)
//! - `duett_rooms_closed_total` – Counter: Geloeschte Raeume (reason)
//! - `duett_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `duett_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Duett-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Zaehler.
#[derive(Clone)]
pub struct DuettMetrics {
    pub registry: Arc<Registry>,

    // Relay-Metriken
    pub connections_active: IntGauge,
    pub rooms_active: IntGauge,
    pub links_issued_total: IntCounter,
    pub signal_events_total: IntCounterVec,
    pub messages_forwarded_total: IntCounter,
    pub messages_dropped_total: IntCounterVec,
    pub rooms_closed_total: IntCounterVec,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl DuettMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Relay-Metriken ---
        let connections_active = IntGauge::with_opts(Opts::new(
            "duett_connections_active",
            "Anzahl offener Event-Kanal-Verbindungen",
        ))?;
        registry.register(Box::new(connections_active.clone()))?;

        let rooms_active = IntGauge::with_opts(Opts::new(
            "duett_rooms_active",
            "Anzahl lebender Raeume",
        ))?;
        registry.register(Box::new(rooms_active.clone()))?;

        let links_issued_total = IntCounter::with_opts(Opts::new(
            "duett_links_issued_total",
            "Gesamtanzahl ausgegebener Einladungslinks",
        ))?;
        registry.register(Box::new(links_issued_total.clone()))?;

        let signal_events_total = IntCounterVec::new(
            Opts::new(
                "duett_signal_events_total",
                "Eingehende Ereignisse nach Ereignisname",
            ),
            &["event"],
        )?;
        registry.register(Box::new(signal_events_total.clone()))?;

        let messages_forwarded_total = IntCounter::with_opts(Opts::new(
            "duett_messages_forwarded_total",
            "An eine Verbindung zugestellte Ereignisse",
        ))?;
        registry.register(Box::new(messages_forwarded_total.clone()))?;

        let messages_dropped_total = IntCounterVec::new(
            Opts::new(
                "duett_messages_dropped_total",
                "Verworfene Ereignisse nach Grund",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(messages_dropped_total.clone()))?;

        let rooms_closed_total = IntCounterVec::new(
            Opts::new("duett_rooms_closed_total", "Geloeschte Raeume nach Grund"),
            &["reason"],
        )?;
        registry.register(Box::new(rooms_closed_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("duett_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "duett_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections_active,
            rooms_active,
            links_issued_total,
            signal_events_total,
            messages_forwarded_total,
            messages_dropped_total,
            rooms_closed_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Zaehlt ein verworfenes Ereignis
    pub fn verworfen(&self, grund: &str) {
        self.messages_dropped_total.with_label_values(&[grund]).inc();
    }

    /// Zaehlt einen geloeschten Raum
    pub fn raum_geschlossen(&self, grund: &str) {
        self.rooms_closed_total.with_label_values(&[grund]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: DuettMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<DuettMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
