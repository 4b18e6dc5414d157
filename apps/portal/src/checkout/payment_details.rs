use serde::{Deserialize, Serialize};

use crate::api_client::UserProfile;
use crate::errors::AppError;
use crate::validation::{has_min_phone_digits, is_blank, is_valid_email, is_valid_pincode, FormErrors};

/// Billing details captured before the hand-off to checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl PaymentDetails {
    /// Pre-fills from whatever the profile already knows. The verified
    /// number is used when the profile has no phone.
    pub fn prefill(profile: Option<&UserProfile>, verified_mobile: Option<&str>) -> Self {
        let field = |value: Option<&Option<String>>| value.and_then(|v| v.clone()).unwrap_or_default();
        let mut details = Self {
            full_name: field(profile.map(|p| &p.name)),
            email: field(profile.map(|p| &p.email)),
            phone: field(profile.map(|p| &p.phone)),
            company_name: field(profile.map(|p| &p.company_name)),
            address: field(profile.map(|p| &p.address)),
            city: field(profile.map(|p| &p.city)),
            state: field(profile.map(|p| &p.state)),
            pincode: field(profile.map(|p| &p.pincode)),
        };
        if is_blank(&details.phone) {
            details.phone = verified_mobile.unwrap_or_default().to_string();
        }
        details
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FormErrors::new();
        errors.require(&self.full_name, "fullName", "Full name");
        errors.require(&self.email, "email", "Email");
        errors.check(
            is_valid_email(&self.email),
            "email",
            "Please enter a valid email address",
        );
        errors.require(&self.phone, "phone", "Phone number");
        errors.check(
            has_min_phone_digits(&self.phone, 10),
            "phone",
            "Please enter a valid phone number (at least 10 digits)",
        );
        errors.require(&self.address, "address", "Address");
        if !is_blank(&self.pincode) {
            errors.check(
                is_valid_pincode(&self.pincode),
                "pincode",
                "Pincode must be 6 digits",
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentDetails {
        PaymentDetails {
            full_name: "Asha Rao".into(),
            email: "asha@acme.in".into(),
            phone: "+91 98765-43210".into(),
            address: "12 MG Road".into(),
            ..PaymentDetails::default()
        }
    }

    #[test]
    fn test_valid_details_pass() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let err = PaymentDetails::default().validate().unwrap_err();
        let msg = err.toast_message();
        assert!(msg.contains("Full name is required"));
        assert!(msg.contains("Email is required"));
        assert!(msg.contains("Address is required"));
    }

    #[test]
    fn test_bad_email_rejected() {
        let details = PaymentDetails {
            email: "asha@acme".into(),
            ..valid()
        };
        assert_eq!(
            details.validate().unwrap_err().toast_message(),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn test_short_phone_rejected() {
        let details = PaymentDetails {
            phone: "98765-432".into(),
            ..valid()
        };
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_pincode_optional_but_checked() {
        assert!(PaymentDetails {
            pincode: "560001".into(),
            ..valid()
        }
        .validate()
        .is_ok());
        assert!(PaymentDetails {
            pincode: "5600".into(),
            ..valid()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_prefill_from_profile() {
        let profile = UserProfile {
            id: "u1".into(),
            name: Some("Asha Rao".into()),
            email: Some("asha@acme.in".into()),
            company_name: Some("Acme".into()),
            ..UserProfile::default()
        };
        let details = PaymentDetails::prefill(Some(&profile), Some("9876543210"));
        assert_eq!(details.full_name, "Asha Rao");
        assert_eq!(details.company_name, "Acme");
        assert_eq!(details.phone, "9876543210");
        assert!(details.address.is_empty());
    }

    #[test]
    fn test_prefill_without_profile() {
        let details = PaymentDetails::prefill(None, None);
        assert_eq!(details, PaymentDetails::default());
    }
}
