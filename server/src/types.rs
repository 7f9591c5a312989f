use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clinic_core::PhoneWidgetConfig;

use crate::geoip::CountryLookup;

// ---------------------------------------------------------------------------
// Server configuration
// ---------------------------------------------------------------------------

/// Runtime configuration. Loaded from `clinic.toml`, then overridden by
/// environment and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Geo-IP service queried for the widget's default country.
    pub geoip_url: String,
    pub geoip_timeout: Duration,
    /// Country reported whenever the geo-IP lookup fails.
    pub fallback_country: String,
    /// Country the phone widget shows before geolocation resolves.
    pub initial_country: String,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            geoip_url: "https://ipinfo.io".to_string(),
            geoip_timeout: Duration::from_millis(3000),
            fallback_country: "us".to_string(),
            initial_country: "ru".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn widget_config(&self) -> PhoneWidgetConfig {
        PhoneWidgetConfig::default().with_initial_country(&self.initial_country)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ---------------------------------------------------------------------------
// Handler context
// ---------------------------------------------------------------------------

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub geoip: Arc<dyn CountryLookup>,
    pub start_time: Instant,
}

impl AppContext {
    pub fn new(config: ServerConfig, geoip: Arc<dyn CountryLookup>) -> Self {
        Self { config: Arc::new(config), geoip, start_time: Instant::now() }
    }
}
