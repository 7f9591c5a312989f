//! Integration tests for the search page, the toggle and the phone widget API.

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{json_body, search_cookie, text_body, ScriptedLookup, TestHarness};
use serde_json::json;

// ---------------------------------------------------------------------------
// Search page visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_page_hidden_only_when_cookie_false() {
    let h = TestHarness::new();
    for (cookie, hidden) in [(None, false), (Some("search=true"), false), (Some("search=false"), true)] {
        let response = h.get("/doctors", cookie).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = text_body(response).await;
        assert_eq!(
            html.contains("class=\"search-form d-none\""),
            hidden,
            "cookie {cookie:?} rendered wrong visibility"
        );
        assert!(html.contains("id=\"id_phone\""));
    }
}

#[tokio::test]
async fn test_preference_endpoint() {
    let h = TestHarness::new();
    let (status, body) = h.get_json("/api/search-preference", Some("a=1; search=false")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hidden"], true);
    assert_eq!(body["value"], "false");

    let (_, body) = h.get_json("/api/search-preference", None).await;
    assert_eq!(body["hidden"], false);
    assert!(body["value"].is_null());
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_toggle_sets_true() {
    let h = TestHarness::new();
    let response = h.post_form("/search/toggle", "", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/doctors");
    assert_eq!(search_cookie(&response).as_deref(), Some("search=true"));

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("Path=/"), "{set_cookie}");
    assert!(set_cookie.contains("Max-Age=31536000"), "{set_cookie}");

    // Still visible after the redirect
    let html = text_body(h.get("/doctors", Some("search=true")).await).await;
    assert!(html.contains("class=\"search-form\""));
}

#[tokio::test]
async fn test_toggle_flips_existing_value() {
    let h = TestHarness::new();

    let response = h.post_form("/search/toggle", "", Some("search=true")).await;
    assert_eq!(search_cookie(&response).as_deref(), Some("search=false"));

    let response = h.post_form("/search/toggle", "", Some("search=false")).await;
    assert_eq!(search_cookie(&response).as_deref(), Some("search=true"));
}

#[tokio::test]
async fn test_toggle_resubmits_search() {
    let h = TestHarness::new();
    let response = h
        .post_form(
            "/search/toggle",
            "first_name=Anna&last_name=&phone=9161234567&dial_code=%2B7",
            Some("search=true"),
        )
        .await;
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/doctors?first_name=Anna&phone=9161234567&dial_code=%2B7");

    let html = text_body(h.get(&location, Some("search=false")).await).await;
    assert!(html.contains("search-form d-none"));
    assert!(html.contains("<li data-field=\"phone\">Телефон: +79161234567</li>"));
    assert!(html.contains("<li data-field=\"first_name\">Имя: Anna</li>"));
}

#[tokio::test]
async fn test_toggle_keeps_empty_phone() {
    let h = TestHarness::new();
    let response =
        h.post_form("/search/toggle", "first_name=Anna&phone=&dial_code=%2B7", Some("search=true")).await;
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/doctors?first_name=Anna&phone=&dial_code=%2B7");

    let html = text_body(h.get(&location, Some("search=false")).await).await;
    assert!(html.contains("<li data-field=\"first_name\">Имя: Anna</li>"));
    assert!(!html.contains("data-field=\"phone\""));
}

// ---------------------------------------------------------------------------
// Doctor search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_search_requires_a_parameter() {
    let h = TestHarness::new();
    let html = text_body(h.get("/doctors?first_name=&phone=&dial_code=%2B7", None).await).await;
    assert!(html.contains("At least one search parameter is required."));
}

#[tokio::test]
async fn test_search_reports_field_errors() {
    let h = TestHarness::new();
    let html = text_body(h.get("/doctors?specialization=Cardio1", None).await).await;
    assert!(html.contains("Specialization must contain only letters."));
    assert!(!html.contains("class=\"results\""));
}

// ---------------------------------------------------------------------------
// Phone widget API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_keystroke_strips_and_pads() {
    let h = TestHarness::new();
    let (status, body) = h
        .post_json("/api/phone/keystroke", json!({ "value": "+7 (916) 12a", "aria_expanded": "true" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "791612");
    assert_eq!(body["padding"], "padding-bottom: 200px");
    assert_eq!(body["dropdown"], "expanded");

    let (_, body) = h
        .post_json("/api/phone/keystroke", json!({ "value": "12", "aria_expanded": "false" }))
        .await;
    assert_eq!(body["padding"], "padding: 6px");
}

#[tokio::test]
async fn test_dropdown_observer_path() {
    let h = TestHarness::new();
    let (_, body) = h.post_json("/api/phone/dropdown", json!({ "aria_expanded": "true" })).await;
    assert_eq!(body["padding"], "padding-bottom: 200px");
    let (_, body) = h.post_json("/api/phone/dropdown", json!({ "aria_expanded": "false" })).await;
    assert_eq!(body["padding"], "padding: 6px");
    let (_, body) = h.post_json("/api/phone/dropdown", json!({})).await;
    assert_eq!(body["dropdown"], "collapsed");
}

#[tokio::test]
async fn test_submit_prefixes_dial_code() {
    let h = TestHarness::new();
    let (status, body) =
        h.post_json("/api/phone/submit", json!({ "dial_code": "+7", "value": "9161234567" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "+79161234567");
    assert_eq!(body["prefixed"], true);
}

#[tokio::test]
async fn test_submit_clears_non_numeric() {
    let h = TestHarness::new();
    for value in ["", "abc"] {
        let (_, body) = h.post_json("/api/phone/submit", json!({ "dial_code": "+7", "value": value })).await;
        assert_eq!(body["value"], "", "value {value:?}");
        assert_eq!(body["prefixed"], false);
    }
}

#[tokio::test]
async fn test_submit_rejects_bad_dial_code() {
    let h = TestHarness::new();
    let (status, body) = h.post_json("/api/phone/submit", json!({ "dial_code": "7", "value": "1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("dial code"));
}

#[tokio::test]
async fn test_widget_config() {
    let h = TestHarness::new();
    let (_, body) = h.get_json("/api/widget", None).await;
    assert_eq!(body["initialCountry"], "ru");
    assert_eq!(body["separateDialCode"], true);
    assert_eq!(body["utilsScript"], "/static/js/utils.js");
}

// ---------------------------------------------------------------------------
// Geo-IP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_geoip_success() {
    let h = TestHarness::with_lookup(ScriptedLookup::Country("kz".to_string()));
    let (status, body) = h.get_json("/api/geoip", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["country"], "kz");
}

#[tokio::test]
async fn test_geoip_failure_falls_back_to_us() {
    let h = TestHarness::with_lookup(ScriptedLookup::Status(500));
    let response = h.get("/api/geoip", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["country"], "us");
}

#[tokio::test]
async fn test_geoip_uses_peer_address_without_proxy() {
    let h = TestHarness::with_lookup(ScriptedLookup::EchoIp);

    let (_, body) = h.get_json_from("/api/geoip", "8.8.8.8:51000", None).await;
    assert_eq!(body["country"], "8.8.8.8");

    // Proxy header wins over the peer
    let (_, body) = h.get_json_from("/api/geoip", "8.8.8.8:51000", Some("1.1.1.1")).await;
    assert_eq!(body["country"], "1.1.1.1");

    // A local peer is not forwarded; the lookup sees no address
    let (_, body) = h.get_json_from("/api/geoip", "127.0.0.1:51000", None).await;
    assert_eq!(body["country"], "us");
}

#[tokio::test]
async fn test_health() {
    let h = TestHarness::new();
    let (status, body) = h.get_json("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["geoip"], "scripted");
}
