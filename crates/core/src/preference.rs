//! Search-visibility preference.
//!
//! A single-bit user preference persisted in the `search` cookie. The page
//! renderer receives a [`SearchPreference`] and decides whether the search form
//! starts hidden; the toggle endpoint flips it and writes the cookie back.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Cookie holding the preference.
pub const SEARCH_COOKIE: &str = "search";

/// Cookie lifetime in days.
pub const SEARCH_COOKIE_DAYS: i64 = 365;

/// Class every search form carries.
pub const SEARCH_FORM_CLASS: &str = "search-form";

/// Class applied to the form while it is hidden.
pub const HIDDEN_CLASS: &str = "d-none";

const VISIBLE: &str = "true";
const HIDDEN: &str = "false";

// ---------------------------------------------------------------------------
// Preference
// ---------------------------------------------------------------------------

/// The stored value of the `search` cookie, if any.
///
/// Any value other than the literal `"false"` (including no value at all)
/// means the form is visible.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchPreference {
    value: Option<String>,
}

impl SearchPreference {
    /// Preference with no cookie written yet.
    pub fn unset() -> Self {
        Self { value: None }
    }

    /// Build from the raw cookie value as received on a request.
    pub fn from_cookie(value: Option<&str>) -> Self {
        Self { value: value.map(str::to_string) }
    }

    /// Extract the preference from a `Cookie` request header.
    ///
    /// The first `search=` pair wins; surrounding whitespace is ignored.
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        let value = header.and_then(|h| {
            h.split(';').map(str::trim).find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name.trim() == SEARCH_COOKIE).then(|| value.trim().trim_matches('"'))
            })
        });
        Self::from_cookie(value)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Hidden iff the stored value is exactly `"false"`.
    pub fn is_hidden(&self) -> bool {
        self.value.as_deref() == Some(HIDDEN)
    }

    /// Class attribute for the search form.
    pub fn form_class(&self) -> String {
        if self.is_hidden() {
            format!("{SEARCH_FORM_CLASS} {HIDDEN_CLASS}")
        } else {
            SEARCH_FORM_CLASS.to_string()
        }
    }

    /// Apply one click of the toggle control.
    ///
    /// An existing value flips between `"true"` and `"false"`; an unknown
    /// value counts as not-`"true"` and becomes `"true"`. With no cookie yet
    /// the value is initialised to `"true"` and visibility does not change.
    pub fn toggle(&self) -> ToggleOutcome {
        let was_hidden = self.is_hidden();
        let next = match self.value.as_deref() {
            Some(VISIBLE) => HIDDEN,
            Some(_) => VISIBLE,
            None => VISIBLE,
        };
        let preference = Self::from_cookie(Some(next));
        ToggleOutcome {
            first_use: self.value.is_none(),
            visibility_changed: was_hidden != preference.is_hidden(),
            cookie: SearchCookie { value: next.to_string() },
            preference,
        }
    }
}

// ---------------------------------------------------------------------------
// Toggle outcome and cookie
// ---------------------------------------------------------------------------

/// Result of a toggle click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub preference: SearchPreference,
    pub cookie: SearchCookie,
    /// No cookie existed before this click.
    pub first_use: bool,
    pub visibility_changed: bool,
}

/// The cookie to write back after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCookie {
    pub value: String,
}

impl SearchCookie {
    /// `Set-Cookie` header value: site-wide path, one-year expiry from `now`.
    pub fn set_cookie_header(&self, now: DateTime<Utc>) -> String {
        let expires = now + Duration::days(SEARCH_COOKIE_DAYS);
        format!(
            "{SEARCH_COOKIE}={}; Path=/; Max-Age={}; Expires={}",
            self.value,
            SEARCH_COOKIE_DAYS * 24 * 60 * 60,
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
