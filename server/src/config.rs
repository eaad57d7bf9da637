//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use duett_observability::{log_format_gueltig, log_level_gueltig};
use duett_signaling::{RollenPolitik, SignalingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Einladungslinks
    pub link: LinkEinstellungen,
    /// Raum-Lebensdauer und Rollen-Politik
    pub raeume: RaumEinstellungen,
    /// Keepalive und Timeout des Ereigniskanals
    pub verbindung: VerbindungsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Duett Server".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub port: u16,
    /// Erlaubte CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3001,
            cors_origins: vec![],
        }
    }
}

/// Einladungslinks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkEinstellungen {
    /// Oeffentliche Basis-URL der Join-Seite
    pub basis_url: String,
}

impl Default for LinkEinstellungen {
    fn default() -> Self {
        Self {
            basis_url: "http://localhost:3000".into(),
        }
    }
}

/// Raum-Lebensdauer und Rollen-Politik
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaumEinstellungen {
    /// Maximales Alter nicht aktiver Raeume in Sekunden (0 = unbegrenzt)
    pub ttl_sek: u64,
    /// Pruefintervall des Raum-Sweepers in Sekunden
    pub sweep_intervall_sek: u64,
    /// "letzter-gewinnt" oder "exklusiv"
    pub rollen_politik: RollenPolitik,
}

impl Default for RaumEinstellungen {
    fn default() -> Self {
        Self {
            ttl_sek: 0,
            sweep_intervall_sek: 60,
            rollen_politik: RollenPolitik::LetzterGewinnt,
        }
    }
}

/// Keepalive und Timeout des Ereigniskanals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Ping-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Trennung nach so vielen Sekunden ohne Empfang (0 = nie)
    pub verbindungs_timeout_sek: u64,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config
                    .validieren()
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte die serde allein nicht abweisen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!(
                "ungueltiges Log-Level '{}' (erlaubt: trace, debug, info, warn, error)",
                self.logging.level
            );
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!(
                "ungueltiges Log-Format '{}' (erlaubt: text, json)",
                self.logging.format
            );
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Raum-TTL, `None` wenn deaktiviert
    pub fn raum_ttl(&self) -> Option<Duration> {
        (self.raeume.ttl_sek > 0).then(|| Duration::from_secs(self.raeume.ttl_sek))
    }

    /// Pruefintervall des Sweepers (mindestens eine Sekunde)
    pub fn sweep_intervall(&self) -> Duration {
        Duration::from_secs(self.raeume.sweep_intervall_sek.max(1))
    }

    /// Leitet die Konfiguration des Signaling-Service ab
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            link_basis_url: self.link.basis_url.clone(),
            rollen_politik: self.raeume.rollen_politik,
            keepalive_sek: self.verbindung.keepalive_sek,
            verbindungs_timeout_sek: self.verbindung.verbindungs_timeout_sek,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.port, 3001);
        assert_eq!(cfg.link.basis_url, "http://localhost:3000");
        assert_eq!(cfg.raeume.rollen_politik, RollenPolitik::LetzterGewinnt);
        assert_eq!(cfg.raum_ttl(), None);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:3001");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            port = 8443
            cors_origins = ["https://duett.example"]

            [link]
            basis_url = "https://duett.example"

            [raeume]
            ttl_sek = 600
            rollen_politik = "exklusiv"
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.netzwerk.port, 8443);
        assert_eq!(cfg.netzwerk.cors_origins, vec!["https://duett.example"]);
        assert_eq!(cfg.raum_ttl(), Some(Duration::from_secs(600)));
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.raeume.sweep_intervall_sek, 60);
        assert_eq!(cfg.verbindung.keepalive_sek, 30);

        let signaling = cfg.signaling_config();
        assert_eq!(signaling.rollen_politik, RollenPolitik::Exklusiv);
        assert_eq!(signaling.link_basis_url, "https://duett.example");
    }

    #[test]
    fn unbekannte_rollen_politik_ist_fehler() {
        let toml = r#"
            [raeume]
            rollen_politik = "wer-zuerst-kommt"
        "#;
        assert!(toml::from_str::<ServerConfig>(toml).is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standard() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/duett.toml").unwrap();
        assert_eq!(cfg.netzwerk.port, 3001);
    }

    #[test]
    fn sweep_intervall_mindestens_eine_sekunde() {
        let mut cfg = ServerConfig::default();
        cfg.raeume.sweep_intervall_sek = 0;
        assert_eq!(cfg.sweep_intervall(), Duration::from_secs(1));
    }

    #[test]
    fn ungueltiges_log_format_wird_abgelehnt() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            [logging]
            format = "jsn"
        "#,
        )
        .unwrap();
        let fehler = cfg.validieren().unwrap_err();
        assert!(fehler.to_string().contains("jsn"));
    }

    #[test]
    fn ungueltiges_log_level_wird_abgelehnt() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validieren().is_err());
        cfg.logging.level = "debug".into();
        cfg.logging.format = "json".into();
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn laden_prueft_logging_werte() {
        let pfad = std::env::temp_dir().join(format!("duett-config-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[logging]\nlevel = \"info\"\nformat = \"jsn\"\n").unwrap();
        let ergebnis = ServerConfig::laden(pfad.to_str().unwrap());
        let _ = std::fs::remove_file(&pfad);

        let fehler = ergebnis.unwrap_err().to_string();
        assert!(fehler.contains("Log-Format"), "{fehler}");
    }
}
