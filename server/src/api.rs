use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Json, State},
    http::{Extensions, HeaderMap},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use clinic_core::phone::{finalize_submission, normalize_digits, DropdownState, FieldPadding};
use clinic_core::{PhoneWidgetConfig, SearchPreference};

use crate::error::{AppError, AppResult};
use crate::geoip::{client_ip, resolve_country};
use crate::types::AppContext;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn api_health(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": Instant::now().duration_since(ctx.start_time).as_secs(),
        "geoip": ctx.geoip.name(),
    }))
}

// ---------------------------------------------------------------------------
// Search preference
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PreferenceResponse {
    value: Option<String>,
    hidden: bool,
    form_class: String,
}

/// `GET /api/search-preference` — the preference as the page would apply it.
pub async fn api_search_preference(headers: HeaderMap) -> Json<PreferenceResponse> {
    let pref = SearchPreference::from_cookie_header(
        headers.get(axum::http::header::COOKIE).and_then(|v| v.to_str().ok()),
    );
    Json(PreferenceResponse {
        value: pref.value().map(str::to_string),
        hidden: pref.is_hidden(),
        form_class: pref.form_class(),
    })
}

// ---------------------------------------------------------------------------
// Phone widget
// ---------------------------------------------------------------------------

/// `GET /api/widget`
pub async fn api_widget(State(ctx): State<AppContext>) -> Json<PhoneWidgetConfig> {
    Json(ctx.config.widget_config())
}

#[derive(Serialize)]
pub struct CountryResponse {
    country: String,
}

/// `GET /api/geoip` — never fails; answers the fallback country instead.
///
/// The connection's peer address is only known when the server runs with
/// connect info; proxy headers take precedence over it.
pub async fn api_geoip(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Json<CountryResponse> {
    let peer = extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip());
    let country =
        resolve_country(ctx.geoip.as_ref(), client_ip(&headers, peer), &ctx.config.fallback_country).await;
    Json(CountryResponse { country })
}

#[derive(Deserialize)]
pub struct KeystrokeRequest {
    value: String,
    #[serde(default)]
    aria_expanded: Option<String>,
}

#[derive(Serialize)]
pub struct KeystrokeResponse {
    value: String,
    padding: FieldPadding,
    dropdown: DropdownState,
}

/// `POST /api/phone/keystroke` — strip the value, then recompute padding.
pub async fn api_phone_keystroke(Json(body): Json<KeystrokeRequest>) -> Json<KeystrokeResponse> {
    let dropdown = DropdownState::from_aria_expanded(body.aria_expanded.as_deref());
    Json(KeystrokeResponse { value: normalize_digits(&body.value), padding: dropdown.padding(), dropdown })
}

#[derive(Deserialize)]
pub struct DropdownRequest {
    #[serde(default)]
    aria_expanded: Option<String>,
}

#[derive(Serialize)]
pub struct DropdownResponse {
    padding: FieldPadding,
    dropdown: DropdownState,
}

/// `POST /api/phone/dropdown` — the selector's `aria-expanded` changed.
pub async fn api_phone_dropdown(Json(body): Json<DropdownRequest>) -> Json<DropdownResponse> {
    let dropdown = DropdownState::from_aria_expanded(body.aria_expanded.as_deref());
    debug!(?dropdown, "Dropdown state changed");
    Json(DropdownResponse { padding: dropdown.padding(), dropdown })
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    dial_code: String,
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    value: String,
    prefixed: bool,
}

/// A dial code as the widget displays it: `+` and one to four digits.
pub fn is_valid_dial_code(code: &str) -> bool {
    code.strip_prefix('+')
        .is_some_and(|d| (1..=4).contains(&d.len()) && d.bytes().all(|b| b.is_ascii_digit()))
}

/// `POST /api/phone/submit`
pub async fn api_phone_submit(Json(body): Json<SubmitRequest>) -> AppResult<Json<SubmitResponse>> {
    let dial_code = body.dial_code.trim();
    if !is_valid_dial_code(dial_code) {
        return Err(AppError::MalformedPayload(format!("invalid dial code {dial_code:?}")));
    }
    let submission = finalize_submission(dial_code, &body.value);
    Ok(Json(SubmitResponse {
        value: submission.value().to_string(),
        prefixed: submission.is_prefixed(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
