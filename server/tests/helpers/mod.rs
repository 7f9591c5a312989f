//! Test harness for HTTP integration tests.
//!
//! Builds the router with a scripted `CountryLookup` and dispatches requests
//! through `tower::ServiceExt::oneshot` (no sockets).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use clinic_server::geoip::{CountryLookup, GeoIpError};
use clinic_server::types::{AppContext, ServerConfig};
use serde_json::Value;
use tower::ServiceExt;

pub enum ScriptedLookup {
    /// Always answers this country.
    Country(String),
    /// Always fails as if the service answered this status.
    Status(u16),
    /// Answers the client address it was given; fails without one.
    EchoIp,
}

#[async_trait]
impl CountryLookup for ScriptedLookup {
    async fn lookup(&self, client_ip: Option<IpAddr>) -> Result<String, GeoIpError> {
        match self {
            Self::Country(country) => Ok(country.clone()),
            Self::Status(status) => Err(GeoIpError::Status(*status)),
            Self::EchoIp => client_ip.map(|ip| ip.to_string()).ok_or(GeoIpError::MissingCountry),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct TestHarness {
    router: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_lookup(ScriptedLookup::Country("ru".to_string()))
    }

    pub fn with_lookup(lookup: ScriptedLookup) -> Self {
        let ctx = AppContext::new(ServerConfig::default(), Arc::new(lookup));
        Self { router: clinic_server::build_router(ctx) }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    /// POST a JSON body and return (status, parsed body).
    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// GET as if the connection came from `peer`, optionally behind a proxy.
    pub async fn get_json_from(
        &self,
        uri: &str,
        peer: &str,
        forwarded_for: Option<&str>,
    ) -> (StatusCode, Value) {
        let peer: SocketAddr = peer.parse().unwrap();
        let mut builder = Request::builder().uri(uri).extension(ConnectInfo(peer));
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let response = self.send(builder.body(Body::empty()).unwrap()).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn get_json(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let response = self.get(uri, cookie).await;
        let status = response.status();
        (status, json_body(response).await)
    }
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    serde_json::from_str(&text_body(response).await).unwrap()
}

/// The `search=<value>` pair of a `Set-Cookie` header.
pub fn search_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
