use serde::Deserialize;

use crate::api_client::SalesEnquiry;
use crate::errors::AppError;
use crate::validation::{has_min_phone_digits, is_blank, is_valid_email, FormErrors};

/// "Contact sales" form for custom-priced plans.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnquiryForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub message: Option<String>,
    pub plan: Option<String>,
}

impl EnquiryForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FormErrors::new();
        errors.require(&self.name, "name", "Name");
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
        errors.require(&self.company_name, "companyName", "Company name");
        errors.into_result()
    }

    pub fn into_enquiry(self) -> SalesEnquiry {
        SalesEnquiry {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company_name: self.company_name.trim().to_string(),
            message: self.message.filter(|m| !is_blank(m)),
            plan: self.plan.filter(|p| !is_blank(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EnquiryForm {
        EnquiryForm {
            name: "Asha Rao".into(),
            email: "asha@acme.in".into(),
            phone: "+91 98765 43210".into(),
            company_name: "Acme".into(),
            message: Some("  ".into()),
            plan: Some("Enterprise".into()),
        }
    }

    #[test]
    fn test_valid_enquiry() {
        assert!(form().validate().is_ok());
        let enquiry = form().into_enquiry();
        assert!(enquiry.message.is_none());
        assert_eq!(enquiry.plan.as_deref(), Some("Enterprise"));
    }

    #[test]
    fn test_company_required() {
        let err = EnquiryForm {
            company_name: " ".into(),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.toast_message(), "Company name is required");
    }
}
