//! International phone input configuration and the DOM contract the page
//! has to honour for the search toggle and phone capture to activate.

use serde::Serialize;
use tracing::error;

// ---------------------------------------------------------------------------
// DOM contract
// ---------------------------------------------------------------------------

/// Id of the phone `<input>`; also the form field name is `phone`.
pub const PHONE_INPUT_ID: &str = "id_phone";

/// Form field carrying the phone value.
pub const PHONE_FIELD_NAME: &str = "phone";

/// Wrapper around the phone input.
pub const PHONE_WRAPPER_CLASS: &str = "field-phone";

/// Toggle control.
pub const TOGGLE_CLASS: &str = "btn";

/// Country selector whose `aria-expanded` attribute drives the padding.
pub const SELECTED_COUNTRY_SELECTOR: &str = ".iti__selected-country";

/// Element whose text is the current dial code.
pub const SELECTED_DIAL_CODE_SELECTOR: &str = ".iti__selected-dial-code";

/// Elements the rendered page must contain, as `(description, marker)` pairs.
/// Markers are matched against the page source.
const REQUIRED_ELEMENTS: &[(&str, &str)] = &[
    ("search form", "class=\"search-form"),
    ("toggle control", "class=\"btn"),
    ("phone wrapper", "class=\"field-phone"),
    ("phone input", "id=\"id_phone\""),
];

/// Return the description of every required element absent from `html`,
/// logging each one. Absence disables the matching behaviour only.
pub fn missing_elements(html: &str) -> Vec<&'static str> {
    REQUIRED_ELEMENTS
        .iter()
        .filter(|(_, marker)| !html.contains(marker))
        .map(|(name, marker)| {
            error!(element = *name, marker = *marker, "Required page element not found");
            *name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Widget configuration
// ---------------------------------------------------------------------------

/// Options handed to the international telephone input on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneWidgetConfig {
    /// Country shown before geolocation resolves.
    pub initial_country: String,
    pub separate_dial_code: bool,
    pub utils_script: String,
    /// Endpoint answering `{"country": ".."}` for the auto-country lookup.
    pub geo_ip_lookup: String,
}

impl Default for PhoneWidgetConfig {
    fn default() -> Self {
        Self {
            initial_country: "ru".to_string(),
            separate_dial_code: true,
            utils_script: "/static/js/utils.js".to_string(),
            geo_ip_lookup: "/api/geoip".to_string(),
        }
    }
}

impl PhoneWidgetConfig {
    pub fn with_initial_country(mut self, country: impl Into<String>) -> Self {
        self.initial_country = country.into().to_lowercase();
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
