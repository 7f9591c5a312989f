//! Phone capture: digit normalization, dropdown-driven padding, and the
//! submission-time dial-code rewrite.
//!
//! A [`PhoneField`] walks `Uninitialized → Initialized → Editing → Submitted`.
//! Editing keeps the value digits-only; submission prefixes the widget's dial
//! code onto the integer value or clears the field when nothing parses.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bottom padding while the country dropdown overlays the field.
pub const EXPANDED_BOTTOM_PADDING: &str = "200px";

/// Uniform padding while the dropdown is closed.
pub const COLLAPSED_PADDING: &str = "6px";

// ---------------------------------------------------------------------------
// Keystroke normalization
// ---------------------------------------------------------------------------

/// Strip every character that is not an ASCII decimal digit.
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

// ---------------------------------------------------------------------------
// Dropdown state and padding
// ---------------------------------------------------------------------------

/// State of the country selector, read from its `aria-expanded` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropdownState {
    Expanded,
    #[default]
    Collapsed,
}

impl DropdownState {
    /// Only the literal `"true"` counts as expanded; a missing attribute is collapsed.
    pub fn from_aria_expanded(attr: Option<&str>) -> Self {
        match attr {
            Some("true") => Self::Expanded,
            _ => Self::Collapsed,
        }
    }

    pub fn padding(self) -> FieldPadding {
        match self {
            Self::Expanded => FieldPadding::ExpandedBottom,
            Self::Collapsed => FieldPadding::Uniform,
        }
    }
}

/// Padding applied to the phone input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPadding {
    /// Room below the field for the dropdown overlay.
    ExpandedBottom,
    #[default]
    Uniform,
}

impl FieldPadding {
    /// Inline style declaration for the input.
    pub fn css(self) -> String {
        match self {
            Self::ExpandedBottom => format!("padding-bottom: {EXPANDED_BOTTOM_PADDING}"),
            Self::Uniform => format!("padding: {COLLAPSED_PADDING}"),
        }
    }
}

impl Serialize for FieldPadding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Parse the leading integer of `value`.
///
/// Leading whitespace and one sign are accepted, then as many digits as
/// follow; anything after them is ignored. Leading zeros are dropped and a
/// negative zero reads as `0`. Returns `None` when no digit is found.
pub fn parse_leading_integer(value: &str) -> Option<String> {
    let rest = value.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let digits = rest[..digits_len].trim_start_matches('0');
    Some(match (digits.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

/// What submission did to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "lowercase")]
pub enum Submission {
    /// Field rewritten to dial code followed by the parsed number.
    Prefixed(String),
    /// Value did not parse; field emptied.
    Cleared,
}

impl Submission {
    /// Value the field holds once the form is sent.
    pub fn value(&self) -> &str {
        match self {
            Self::Prefixed(v) => v,
            Self::Cleared => "",
        }
    }

    pub fn is_prefixed(&self) -> bool {
        matches!(self, Self::Prefixed(_))
    }
}

/// Rewrite the phone value for submission.
pub fn finalize_submission(dial_code: &str, value: &str) -> Submission {
    match parse_leading_integer(value) {
        Some(number) => Submission::Prefixed(format!("{}{number}", dial_code.trim())),
        None => {
            debug!(value, "Phone value not numeric, clearing field");
            Submission::Cleared
        }
    }
}

// ---------------------------------------------------------------------------
// Field state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneFieldState {
    Uninitialized,
    Initialized,
    Editing,
    Submitted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneFieldError {
    #[error("phone widget is not attached to the field")]
    NotInitialized,
    #[error("phone widget is already attached")]
    AlreadyInitialized,
    #[error("phone field was already submitted")]
    AlreadySubmitted,
}

/// One phone input and the widget attached to it.
#[derive(Debug, Clone)]
pub struct PhoneField {
    state: PhoneFieldState,
    value: String,
    dropdown: DropdownState,
}

impl Default for PhoneField {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneField {
    pub fn new() -> Self {
        Self {
            state: PhoneFieldState::Uninitialized,
            value: String::new(),
            dropdown: DropdownState::Collapsed,
        }
    }

    pub fn state(&self) -> PhoneFieldState {
        self.state
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn padding(&self) -> FieldPadding {
        self.dropdown.padding()
    }

    /// Attach the widget.
    pub fn attach(&mut self) -> Result<(), PhoneFieldError> {
        match self.state {
            PhoneFieldState::Uninitialized => {
                self.state = PhoneFieldState::Initialized;
                Ok(())
            }
            PhoneFieldState::Submitted => Err(PhoneFieldError::AlreadySubmitted),
            _ => Err(PhoneFieldError::AlreadyInitialized),
        }
    }

    fn ensure_live(&self) -> Result<(), PhoneFieldError> {
        match self.state {
            PhoneFieldState::Uninitialized => Err(PhoneFieldError::NotInitialized),
            PhoneFieldState::Submitted => Err(PhoneFieldError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    /// A key was pressed: `raw` is the input's current content, `aria_expanded`
    /// the selector's attribute at that moment.
    pub fn keystroke(
        &mut self,
        raw: &str,
        aria_expanded: Option<&str>,
    ) -> Result<FieldPadding, PhoneFieldError> {
        self.ensure_live()?;
        self.value = normalize_digits(raw);
        self.dropdown = DropdownState::from_aria_expanded(aria_expanded);
        self.state = PhoneFieldState::Editing;
        Ok(self.padding())
    }

    /// The selector's `aria-expanded` attribute changed.
    pub fn dropdown_changed(
        &mut self,
        aria_expanded: Option<&str>,
    ) -> Result<FieldPadding, PhoneFieldError> {
        self.ensure_live()?;
        self.dropdown = DropdownState::from_aria_expanded(aria_expanded);
        Ok(self.padding())
    }

    /// The surrounding form is being sent.
    pub fn submit(&mut self, dial_code: &str) -> Result<Submission, PhoneFieldError> {
        self.ensure_live()?;
        let submission = finalize_submission(dial_code, &self.value);
        self.value = submission.value().to_string();
        self.state = PhoneFieldState::Submitted;
        Ok(submission)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
