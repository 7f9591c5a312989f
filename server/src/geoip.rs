//! Geo-IP country lookup for the phone widget's automatic default country.
//!
//! Provides a `CountryLookup` trait with two implementations: `IpInfoLookup`
//! (queries an ipinfo-compatible HTTP service, bypassing caches) and
//! `FixedCountry` (no network, used when the lookup is disabled). Callers go
//! through [`resolve_country`], which never fails: any error yields the
//! configured fallback.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum GeoIpError {
    #[error("geo-ip request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geo-ip service answered {0}")]
    Status(u16),
    #[error("geo-ip response has no country")]
    MissingCountry,
}

#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// Two-letter country code for `client_ip`, or for the caller's own
    /// address when `None`.
    async fn lookup(&self, client_ip: Option<IpAddr>) -> Result<String, GeoIpError>;
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ipinfo
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IpInfoResponse {
    country: Option<String>,
}

/// Lookup against `https://ipinfo.io` or any service with the same JSON shape.
pub struct IpInfoLookup {
    client: reqwest::Client,
    base_url: String,
}

impl IpInfoLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GeoIpError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url_for(&self, client_ip: Option<IpAddr>) -> String {
        match client_ip {
            Some(ip) => format!("{}/{ip}", self.base_url),
            None => self.base_url.clone(),
        }
    }
}

#[async_trait]
impl CountryLookup for IpInfoLookup {
    async fn lookup(&self, client_ip: Option<IpAddr>) -> Result<String, GeoIpError> {
        let url = self.url_for(client_ip);
        debug!(url = url.as_str(), "Geo-IP lookup");

        // Always revalidate upstream
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoIpError::Status(status.as_u16()));
        }

        let body: IpInfoResponse = response.json().await?;
        body.country
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .ok_or(GeoIpError::MissingCountry)
    }

    fn name(&self) -> &str {
        "ipinfo"
    }
}

// ---------------------------------------------------------------------------
// Fixed
// ---------------------------------------------------------------------------

/// Always answers the same country. Used when no geo-IP service is configured.
pub struct FixedCountry(pub String);

#[async_trait]
impl CountryLookup for FixedCountry {
    async fn lookup(&self, _client_ip: Option<IpAddr>) -> Result<String, GeoIpError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a country, falling back on any failure.
pub async fn resolve_country(
    lookup: &dyn CountryLookup,
    client_ip: Option<IpAddr>,
    fallback: &str,
) -> String {
    match lookup.lookup(client_ip).await {
        Ok(country) => country,
        Err(e) => {
            warn!(lookup = lookup.name(), error = %e, fallback, "Geo-IP lookup failed, using fallback");
            fallback.to_string()
        }
    }
}

/// Whether ipinfo can geolocate `ip`. Loopback, private, link-local and
/// unspecified addresses carry no location.
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_routable(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Client address for the lookup: the proxy headers when present, otherwise
/// the peer of the connection. Addresses without a location are dropped so
/// the service geolocates the caller instead.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()));

    let ip = match forwarded {
        Some(value) => value.trim().parse().ok()?,
        None => peer?,
    };
    is_routable(ip).then_some(ip)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
