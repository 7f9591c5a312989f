//! Server-rendered doctor search page and the search-visibility toggle.
//!
//! The page receives the visitor's [`SearchPreference`] explicitly and renders
//! the form hidden or visible from it. The toggle control posts the search
//! form to `/search/toggle`, which flips the cookie and re-submits the search
//! by redirecting back to `/doctors` with the same parameters.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::{
    extract::{Form, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
};
use chrono::Utc;
use tracing::{debug, info, warn};

use clinic_core::search_form::NON_FIELD_ERRORS;
use clinic_core::widget::{
    missing_elements, PHONE_FIELD_NAME, PHONE_INPUT_ID, PHONE_WRAPPER_CLASS, SELECTED_COUNTRY_SELECTOR,
    SELECTED_DIAL_CODE_SELECTOR, TOGGLE_CLASS,
};
use clinic_core::{
    normalize_digits, DoctorSearchForm, DoctorSearchQuery, FieldErrors, FieldPadding, PhoneWidgetConfig,
    SearchPreference,
};

use crate::error::{AppError, AppResult};
use crate::types::AppContext;

const SEARCH_FORM_ID: &str = "doctor-search";

/// Form fields echoed back on redirect, in page order.
const SEARCH_FIELDS: &[&str] =
    &["first_name", "last_name", "specialization", "username", "email", PHONE_FIELD_NAME, "dial_code"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn preference_from(headers: &HeaderMap) -> SearchPreference {
    SearchPreference::from_cookie_header(headers.get(header::COOKIE).and_then(|v| v.to_str().ok()))
}

fn field_label(field: &str) -> &'static str {
    match field {
        "first_name" => "Имя",
        "last_name" => "Фамилия",
        "specialization" => "Специализация",
        "username" => "Имя пользователя",
        "email" => "Email",
        "phone" => "Телефон",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Everything the search page shows.
pub struct SearchPage<'a> {
    pub preference: &'a SearchPreference,
    pub widget: &'a PhoneWidgetConfig,
    pub form: &'a DoctorSearchForm,
    /// `None` until something was searched for.
    pub outcome: Option<&'a Result<DoctorSearchQuery, FieldErrors>>,
}

fn text_input(html: &mut String, name: &str, value: &str, errors: Option<&FieldErrors>) {
    let _ = write!(
        html,
        "    <label>{label} <input type=\"text\" name=\"{name}\" value=\"{value}\"></label>\n",
        label = field_label(name),
        value = escape_html(value),
    );
    if let Some(err) = errors.and_then(|e| e.get(name)) {
        let _ = writeln!(html, "    <p class=\"error\">{}</p>", escape_html(&err.to_string()));
    }
}

pub fn render_search_page(page: &SearchPage<'_>) -> AppResult<String> {
    let widget_json = serde_json::to_string(page.widget)
        .map_err(|e| AppError::Internal(format!("widget config: {e}")))?;
    let errors = match page.outcome {
        Some(Err(errors)) => Some(errors),
        _ => None,
    };

    let mut html = String::with_capacity(4096);
    html.push_str(concat!(
        "<!DOCTYPE html>\n<html lang=\"ru\">\n<head>\n",
        "  <meta charset=\"utf-8\">\n  <title>Врачи</title>\n",
        "  <link rel=\"stylesheet\" href=\"/static/css/intlTelInput.css\">\n",
        "  <link rel=\"stylesheet\" href=\"/static/css/phone.css\">\n",
        "</head>\n<body>\n",
    ));

    let _ = writeln!(
        html,
        "  <button class=\"{TOGGLE_CLASS} btn-outline-secondary\" type=\"submit\" form=\"{SEARCH_FORM_ID}\" \
         formaction=\"/search/toggle\" formmethod=\"post\">Поиск</button>"
    );
    let _ = writeln!(
        html,
        "  <form id=\"{SEARCH_FORM_ID}\" class=\"{}\" method=\"get\" action=\"/doctors\">",
        page.preference.form_class()
    );

    let form = page.form;
    text_input(&mut html, "first_name", &form.first_name, errors);
    text_input(&mut html, "last_name", &form.last_name, errors);
    text_input(&mut html, "specialization", &form.specialization, errors);
    text_input(&mut html, "username", &form.username, errors);
    text_input(&mut html, "email", &form.email, errors);

    let phone = form.phone.as_deref().map(normalize_digits).unwrap_or_default();
    let _ = writeln!(
        html,
        "    <div class=\"{PHONE_WRAPPER_CLASS}\"><label>{label} <input type=\"tel\" id=\"{PHONE_INPUT_ID}\" \
         name=\"{PHONE_FIELD_NAME}\" value=\"{phone}\" style=\"{style}\" data-widget=\"{config}\" \
         data-country-selector=\"{SELECTED_COUNTRY_SELECTOR}\" data-dial-code-selector=\"{SELECTED_DIAL_CODE_SELECTOR}\">\
         </label></div>",
        label = field_label(PHONE_FIELD_NAME),
        style = FieldPadding::Uniform.css(),
        config = escape_html(&widget_json),
    );
    let _ = writeln!(
        html,
        "    <input type=\"hidden\" name=\"dial_code\" value=\"{}\">",
        escape_html(&form.dial_code)
    );
    if let Some(err) = errors.and_then(|e| e.get(NON_FIELD_ERRORS)) {
        let _ = writeln!(html, "    <p class=\"error\">{}</p>", escape_html(&err.to_string()));
    }
    html.push_str("    <button type=\"submit\">Найти</button>\n  </form>\n");

    if let Some(Ok(query)) = page.outcome {
        html.push_str("  <section class=\"results\">\n    <ul class=\"filters\">\n");
        for (field, value) in query.filters() {
            let _ = writeln!(
                html,
                "      <li data-field=\"{field}\">{}: {}</li>",
                field_label(field),
                escape_html(value)
            );
        }
        html.push_str("    </ul>\n  </section>\n");
    }

    let _ = writeln!(html, "  <script src=\"/static/js/intlTelInput.js\"></script>");
    html.push_str("</body>\n</html>\n");

    for missing in missing_elements(&html) {
        warn!(element = missing, "Search page rendered without element, feature disabled");
    }
    Ok(html)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /doctors` — render the page; run the search when parameters were sent.
pub async fn page_doctors(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(form): Query<DoctorSearchForm>,
) -> AppResult<Html<String>> {
    let preference = preference_from(&headers);
    let submitted = raw.is_some_and(|q| !q.is_empty());
    let outcome = submitted.then(|| form.clean());

    match &outcome {
        Some(Ok(query)) => info!(filters = query.filters().len(), "Doctor search"),
        Some(Err(errors)) => debug!(errors = errors.len(), "Doctor search rejected"),
        None => {}
    }

    let widget = ctx.config.widget_config();
    let html = render_search_page(&SearchPage {
        preference: &preference,
        widget: &widget,
        form: &form,
        outcome: outcome.as_ref(),
    })?;
    Ok(Html(html))
}

/// `POST /search/toggle` — flip the preference, then re-submit the search.
pub async fn search_toggle(
    headers: HeaderMap,
    Form(fields): Form<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let outcome = preference_from(&headers).toggle();
    info!(
        value = outcome.cookie.value.as_str(),
        first_use = outcome.first_use,
        visibility_changed = outcome.visibility_changed,
        "Search visibility toggled"
    );

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for field in SEARCH_FIELDS {
        // An empty phone is still echoed: its presence marks the rendered input
        let keep_empty = *field == PHONE_FIELD_NAME;
        if let Some(value) = fields.get(*field).filter(|v| keep_empty || !v.is_empty()) {
            query.append_pair(field, value);
        }
    }
    let query = query.finish();
    let location = if query.is_empty() { "/doctors".to_string() } else { format!("/doctors?{query}") };

    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location),
            (header::SET_COOKIE, outcome.cookie.set_cookie_header(Utc::now())),
        ],
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
