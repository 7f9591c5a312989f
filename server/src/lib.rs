//! Clinic front desk — HTTP server for the doctor search page.
//!
//! This crate serves the server-rendered doctor search page together with the
//! small JSON API its phone widget talks to.
//!
//! # Modules
//!
//! - [`pages`] — Search page rendering and the search-visibility toggle
//! - [`api`] — JSON handlers: phone keystrokes, dropdown padding, submission, geo-IP, widget config
//! - [`geoip`] — Pluggable country lookup with fallback
//! - [`doctor`] — `doctor` subcommand: configuration and static asset checks
//! - [`types`] — Server configuration and handler context
//! - [`error`] — Handler error type

pub mod api;
pub mod doctor;
pub mod error;
pub mod geoip;
pub mod pages;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use geoip::{CountryLookup, FixedCountry, IpInfoLookup};
use types::{AppContext, ServerConfig};

// ---------------------------------------------------------------------------
// clinic.toml config loading
// ---------------------------------------------------------------------------

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "clinic.toml";

/// Known keys in `clinic.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "bind",
    "port",
    "geoip_url",
    "geoip_timeout_ms",
    "fallback_country",
    "initial_country",
    "static_dir",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not parse {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

pub fn is_known_key(key: &str) -> bool {
    KNOWN_CONFIG_KEYS.contains(&key)
}

/// Closest known key to `key`, when it is a plausible typo.
pub fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_CONFIG_KEYS
        .iter()
        .copied()
        .min_by_key(|k| edit_distance(key, k))
        .filter(|k| edit_distance(key, k) <= 3)
}

fn string_key(table: &toml::Table, key: &'static str) -> Result<Option<String>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or(ConfigError::Invalid { key, reason: "expected a string".to_string() }),
    }
}

fn integer_key(table: &toml::Table, key: &'static str) -> Result<Option<i64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_integer()
            .map(Some)
            .ok_or(ConfigError::Invalid { key, reason: "expected an integer".to_string() }),
    }
}

/// Apply the keys of a parsed `clinic.toml` on top of `config`.
///
/// Unknown keys are not an error; they trigger a warning with a typo suggestion.
pub fn apply_config_table(config: &mut ServerConfig, table: &toml::Table) -> Result<(), ConfigError> {
    for key in table.keys() {
        if is_known_key(key) {
            continue;
        }
        match suggest_key(key) {
            Some(suggestion) => warn!(
                key = key.as_str(),
                suggestion,
                "Unknown key in {CONFIG_FILE} — did you mean '{suggestion}'?"
            ),
            None => warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            ),
        }
    }

    if let Some(bind) = string_key(table, "bind")? {
        config.bind = bind;
    }
    if let Some(port) = integer_key(table, "port")? {
        config.port = u16::try_from(port)
            .map_err(|_| ConfigError::Invalid { key: "port", reason: format!("{port} out of range") })?;
    }
    if let Some(url) = string_key(table, "geoip_url")? {
        config.geoip_url = url;
    }
    if let Some(ms) = integer_key(table, "geoip_timeout_ms")? {
        let ms = u64::try_from(ms)
            .map_err(|_| ConfigError::Invalid { key: "geoip_timeout_ms", reason: "must not be negative".into() })?;
        config.geoip_timeout = Duration::from_millis(ms);
    }
    if let Some(country) = string_key(table, "fallback_country")? {
        config.fallback_country = country.to_lowercase();
    }
    if let Some(country) = string_key(table, "initial_country")? {
        config.initial_country = country.to_lowercase();
    }
    if let Some(dir) = string_key(table, "static_dir")? {
        config.static_dir = dir.into();
    }
    Ok(())
}

/// Load server configuration from `path`.
///
/// A missing file yields defaults. A present but invalid file is an error.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(config);
    }

    let shown = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: shown.clone(), source })?;
    let table: toml::Table =
        content.parse().map_err(|source| ConfigError::Parse { path: shown.clone(), source })?;
    apply_config_table(&mut config, &table)?;
    info!(path = shown.as_str(), "Loaded config");
    Ok(config)
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Build the geo-IP lookup for `config`. An empty `geoip_url` disables the
/// network lookup and always answers the fallback country.
pub fn build_lookup(config: &ServerConfig) -> Arc<dyn CountryLookup> {
    if config.geoip_url.trim().is_empty() {
        info!(country = config.fallback_country.as_str(), "Geo-IP lookup disabled");
        return Arc::new(FixedCountry(config.fallback_country.clone()));
    }
    match IpInfoLookup::new(&config.geoip_url, config.geoip_timeout) {
        Ok(lookup) => Arc::new(lookup),
        Err(e) => {
            warn!(error = %e, "Could not build geo-IP client, lookups will use the fallback country");
            Arc::new(FixedCountry(config.fallback_country.clone()))
        }
    }
}

/// Routes for the page, the widget API and static files.
pub fn build_router(ctx: AppContext) -> Router {
    let static_dir = ctx.config.static_dir.clone();
    Router::new()
        .route("/", get(pages::page_doctors))
        .route("/doctors", get(pages::page_doctors))
        .route("/search/toggle", post(pages::search_toggle))
        .route("/health", get(api::api_health))
        .route("/api/search-preference", get(api::api_search_preference))
        .route("/api/widget", get(api::api_widget))
        .route("/api/geoip", get(api::api_geoip))
        .route("/api/phone/keystroke", post(api::api_phone_keystroke))
        .route("/api/phone/dropdown", post(api::api_phone_dropdown))
        .route("/api/phone/submit", post(api::api_phone_submit))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
