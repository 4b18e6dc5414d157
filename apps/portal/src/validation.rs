//! Client-side format checks. A UX convenience only; the backend remains the
//! authority on every field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;

/// Indian 10-digit mobile number, leading digit 6–9.
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("Invalid regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("Invalid regex"));

pub const OTP_LENGTH: usize = 6;

/// Strips spaces and hyphens, the separators users type into phone fields.
pub fn clean_mobile(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Expects an already cleaned number.
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

/// Digits only, truncated to the OTP length, applied as the user types.
pub fn sanitize_otp_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(OTP_LENGTH)
        .collect()
}

pub fn is_complete_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Phone fields outside the OTP flow accept any separators as long as at
/// least ten digits remain.
pub fn has_min_phone_digits(phone: &str, min: usize) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= min
}

pub fn is_valid_pincode(pincode: &str) -> bool {
    PINCODE_RE.is_match(pincode.trim())
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Per-field validation messages, in field-name order.
#[derive(Debug, Default)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first failure per field; later ones are ignored.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.fields
                .entry(field)
                .or_insert_with(|| message.to_string());
        }
    }

    pub fn require(&mut self, value: &str, field: &'static str, label: &str) {
        self.check(!is_blank(value), field, &format!("{label} is required"));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Validation` error carrying every message, joined for the toast.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            return Ok(());
        }
        let message = self
            .fields
            .into_values()
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_pattern() {
        assert!(is_valid_mobile("9876543210"));
        assert!(is_valid_mobile("6000000000"));
        assert!(!is_valid_mobile("12345"));
        assert!(!is_valid_mobile("5876543210"));
        assert!(!is_valid_mobile("98765432101"));
        assert!(!is_valid_mobile("98765 43210"));
    }

    #[test]
    fn test_clean_mobile_strips_separators() {
        assert_eq!(clean_mobile("98765-43210"), "9876543210");
        assert_eq!(clean_mobile(" 98765 43210 "), "9876543210");
        assert!(is_valid_mobile(&clean_mobile("987-654-3210")));
    }

    #[test]
    fn test_sanitize_otp_input() {
        assert_eq!(sanitize_otp_input("12a3-45"), "12345");
        assert_eq!(sanitize_otp_input("123456789"), "123456");
        assert_eq!(sanitize_otp_input("abc"), "");
        assert!(is_complete_otp("004321"));
        assert!(!is_complete_otp("12345"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("hr@acme.in"));
        assert!(is_valid_email(" hr@acme.co.in "));
        assert!(!is_valid_email("hr@acme"));
        assert!(!is_valid_email("hr acme@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone_digit_count_ignores_separators() {
        assert!(has_min_phone_digits("+91 98765-43210", 10));
        assert!(has_min_phone_digits("(022) 2345 6789", 10));
        assert!(!has_min_phone_digits("98765", 10));
    }

    #[test]
    fn test_form_errors_first_message_per_field_wins() {
        let mut errors = FormErrors::new();
        errors.require("", "email", "Email");
        errors.check(false, "email", "Enter a valid email address");
        errors.require("Acme", "company", "Company");
        assert!(!errors.is_empty());

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.toast_message(), "Email is required");
    }

    #[test]
    fn test_form_errors_empty_is_ok() {
        assert!(FormErrors::new().into_result().is_ok());
    }
}
