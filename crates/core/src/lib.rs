//! Clinic front desk — core logic shared by the server.
//!
//! Pure, I/O-free pieces of the doctor search page:
//!
//! - [`preference`] — Search-visibility preference persisted in the `search` cookie
//! - [`phone`] — Phone field state machine: digit normalization, dropdown padding, dial-code rewrite
//! - [`widget`] — International phone input configuration and the page's DOM contract
//! - [`search_form`] — Doctor search form validators and the cleaned query

pub mod phone;
pub mod preference;
pub mod search_form;
pub mod widget;

pub use phone::{finalize_submission, normalize_digits, DropdownState, FieldPadding, PhoneField, Submission};
pub use preference::{SearchCookie, SearchPreference, ToggleOutcome};
pub use search_form::{DoctorSearchForm, DoctorSearchQuery, FieldErrors, ValidationError};
pub use widget::PhoneWidgetConfig;
