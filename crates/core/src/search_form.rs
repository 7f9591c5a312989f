//! Doctor search form: field validators and the cleaned query.
//!
//! Every field is optional but at least one must carry a value. Names and
//! specialization are letters-only; the phone value goes through the same
//! dial-code rewrite the widget applies on submission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::phone::finalize_submission;
use crate::widget::PHONE_INPUT_ID;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const FIRST_NAME_MAX_LENGTH: usize = 30;
pub const LAST_NAME_MAX_LENGTH: usize = 30;
pub const SPECIALIZATION_MAX_LENGTH: usize = 30;
pub const MAX_USERNAME_LENGTH: usize = 15;
pub const MAX_EMAIL_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ValidationError {
    #[error("First name is required.")]
    FirstNameRequired,
    #[error("First name must contain only letters.")]
    FirstNameFormat,
    #[error("First name cannot be longer than 30 characters.")]
    FirstNameLength,
    #[error("Last name is required.")]
    LastNameRequired,
    #[error("Last name must contain only letters.")]
    LastNameFormat,
    #[error("Last name cannot be longer than 30 characters.")]
    LastNameLength,
    #[error("Specialization must contain only letters.")]
    SpecializationFormat,
    #[error("Specialization cannot be longer than 30 characters.")]
    SpecializationLength,
    #[error("Username cannot be longer than 15 characters.")]
    UsernameLength,
    #[error("Enter a valid email address.")]
    EmailFormat,
    #[error("Email cannot be longer than 64 characters.")]
    EmailLength,
    #[error("At least one search parameter is required.")]
    SearchParamRequired,
}

impl From<ValidationError> for String {
    fn from(err: ValidationError) -> Self {
        err.to_string()
    }
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

fn is_letters(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphabetic)
}

/// Required first name: letters only, bounded length.
pub fn validate_first_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::FirstNameRequired);
    }
    if !is_letters(name) {
        return Err(ValidationError::FirstNameFormat);
    }
    if name.chars().count() > FIRST_NAME_MAX_LENGTH {
        return Err(ValidationError::FirstNameLength);
    }
    Ok(name)
}

/// Required last name: letters only, bounded length.
pub fn validate_last_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::LastNameRequired);
    }
    if !is_letters(name) {
        return Err(ValidationError::LastNameFormat);
    }
    if name.chars().count() > LAST_NAME_MAX_LENGTH {
        return Err(ValidationError::LastNameLength);
    }
    Ok(name)
}

pub fn validate_specialization(specialization: &str) -> Result<&str, ValidationError> {
    if !is_letters(specialization) {
        return Err(ValidationError::SpecializationFormat);
    }
    if specialization.chars().count() > SPECIALIZATION_MAX_LENGTH {
        return Err(ValidationError::SpecializationLength);
    }
    Ok(specialization)
}

pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameLength);
    }
    Ok(username)
}

pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailLength);
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(ValidationError::EmailFormat),
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Raw form submission, as posted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// `None` when the page rendered no phone input.
    pub phone: Option<String>,
    /// Dial code shown by the widget at submit time.
    #[serde(default)]
    pub dial_code: String,
}

/// A validated search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorSearchQuery {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub username: String,
    pub email: String,
    /// Dial code plus number, or empty.
    pub phone: String,
}

impl DoctorSearchQuery {
    /// Non-empty filters, in display order.
    pub fn filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("specialization", self.specialization.as_str()),
            ("username", self.username.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

/// Field name → error. `__all__` holds form-level errors.
pub type FieldErrors = BTreeMap<&'static str, ValidationError>;

/// Name used for errors not tied to a field.
pub const NON_FIELD_ERRORS: &str = "__all__";

fn check_optional(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    validate: fn(&str) -> Result<&str, ValidationError>,
) {
    if value.is_empty() {
        return;
    }
    if let Err(e) = validate(value) {
        errors.insert(field, e);
    }
}

impl DoctorSearchForm {
    /// Validate and clean the submission.
    pub fn clean(&self) -> Result<DoctorSearchQuery, FieldErrors> {
        let mut query = DoctorSearchQuery {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            specialization: self.specialization.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: String::new(),
        };

        match &self.phone {
            Some(raw) => query.phone = finalize_submission(&self.dial_code, raw).value().to_string(),
            None => error!(input = PHONE_INPUT_ID, "Phone input missing from form, phone capture skipped"),
        }

        let mut errors = FieldErrors::new();
        check_optional(&mut errors, "first_name", &query.first_name, validate_first_name);
        check_optional(&mut errors, "last_name", &query.last_name, validate_last_name);
        check_optional(&mut errors, "specialization", &query.specialization, validate_specialization);
        check_optional(&mut errors, "username", &query.username, validate_username);
        check_optional(&mut errors, "email", &query.email, validate_email);

        if errors.is_empty() && query.filters().is_empty() {
            errors.insert(NON_FIELD_ERRORS, ValidationError::SearchParamRequired);
        }

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_rules() {
        assert_eq!(validate_first_name("John"), Ok("John"));
        assert_eq!(validate_first_name("Иван"), Ok("Иван"));
        assert_eq!(validate_first_name(""), Err(ValidationError::FirstNameRequired));
        assert_eq!(validate_first_name("John123"), Err(ValidationError::FirstNameFormat));
        let long = "J".repeat(FIRST_NAME_MAX_LENGTH + 1);
        assert_eq!(validate_first_name(&long), Err(ValidationError::FirstNameLength));
        assert_eq!(
            ValidationError::FirstNameLength.to_string(),
            "First name cannot be longer than 30 characters."
        );
    }

    #[test]
    fn last_name_rules() {
        assert_eq!(validate_last_name("Doe"), Ok("Doe"));
        assert_eq!(validate_last_name(""), Err(ValidationError::LastNameRequired));
        assert_eq!(validate_last_name("Doe123"), Err(ValidationError::LastNameFormat));
    }

    #[test]
    fn specialization_rules() {
        assert_eq!(validate_specialization("Cardiology"), Ok("Cardiology"));
        assert_eq!(
            validate_specialization("Cardiology123").unwrap_err().to_string(),
            "Specialization must contain only letters."
        );
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("doc@clinic.ru").is_ok());
        assert_eq!(validate_email("doc"), Err(ValidationError::EmailFormat));
        assert_eq!(validate_email("a@b@c"), Err(ValidationError::EmailFormat));
        let long = format!("{}@x.ru", "a".repeat(MAX_EMAIL_LENGTH));
        assert_eq!(validate_email(&long), Err(ValidationError::EmailLength));
    }

    #[test]
    fn empty_form_needs_a_parameter() {
        let form = DoctorSearchForm { phone: Some(String::new()), dial_code: "+7".into(), ..Default::default() };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.get(NON_FIELD_ERRORS), Some(&ValidationError::SearchParamRequired));
    }

    #[test]
    fn phone_alone_is_enough() {
        let form = DoctorSearchForm {
            phone: Some("9161234567".into()),
            dial_code: "+7".into(),
            ..Default::default()
        };
        let query = form.clean().unwrap();
        assert_eq!(query.phone, "+79161234567");
        assert_eq!(query.filters(), vec![("phone", "+79161234567")]);
    }

    #[test]
    fn trims_and_reports_field_errors() {
        let form = DoctorSearchForm {
            first_name: "  Anna ".into(),
            last_name: "Smith2".into(),
            phone: Some("abc".into()),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("last_name"), Some(&ValidationError::LastNameFormat));
    }

    #[test]
    fn missing_phone_input_is_not_fatal() {
        let form: DoctorSearchForm =
            serde_json::from_value(serde_json::json!({ "specialization": "Surgery" })).unwrap();
        assert!(form.phone.is_none());
        let query = form.clean().unwrap();
        assert_eq!(query.specialization, "Surgery");
        assert!(query.phone.is_empty());
    }
}
