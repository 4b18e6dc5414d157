//! Employer registration, password login and phone login.
//!
//! Every successful sign-in stores the token through `SessionStore`, which
//! broadcasts `authStateChanged` to the rest of the portal.

use serde::Deserialize;
use tracing::{info, warn};

use crate::api_client::{
    AuthResponse, EmployerApi, LoginRequest, PhoneLoginRequest, RegisterRequest, UserProfile,
};
use crate::errors::AppError;
use crate::otp::OtpFlow;
use crate::session::SessionStore;
use crate::validation::{clean_mobile, is_valid_email, is_valid_mobile, FormErrors};

pub mod handlers;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub company_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FormErrors::new();
        errors.require(&self.company_name, "companyName", "Company name");
        errors.require(&self.name, "name", "Contact name");
        errors.require(&self.email, "email", "Email");
        errors.check(
            is_valid_email(&self.email),
            "email",
            "Please enter a valid email address",
        );
        errors.check(
            is_valid_mobile(&clean_mobile(&self.phone)),
            "phone",
            "Please enter a valid 10-digit mobile number",
        );
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            "Password must be at least 8 characters",
        );
        errors.check(
            self.password == self.confirm_password,
            "confirmPassword",
            "Passwords do not match",
        );
        errors.into_result()
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            company_name: self.company_name.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: clean_mobile(&self.phone),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FormErrors::new();
        errors.check(
            is_valid_email(&self.email),
            "email",
            "Please enter a valid email address",
        );
        errors.check(!self.password.is_empty(), "password", "Password is required");
        errors.into_result()
    }
}

fn store_session(session: &SessionStore, auth: AuthResponse) -> Result<UserProfile, AppError> {
    session.set_token(&auth.token)?;
    Ok(auth.user)
}

pub async fn register(
    session: &SessionStore,
    api: &dyn EmployerApi,
    form: &RegistrationForm,
) -> Result<UserProfile, AppError> {
    form.validate()?;
    let auth = api.register_employer(&form.to_request()).await?;
    info!("Employer registered");
    store_session(session, auth)
}

pub async fn login(
    session: &SessionStore,
    api: &dyn EmployerApi,
    form: &LoginForm,
) -> Result<UserProfile, AppError> {
    form.validate()?;
    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    let auth = api.login_employer(&request).await?;
    info!("Employer logged in");
    store_session(session, auth)
}

/// Verifies the login OTP, then exchanges the verified number for a session.
pub async fn complete_phone_login(
    session: &SessionStore,
    api: &dyn EmployerApi,
    flow: &OtpFlow,
) -> Result<UserProfile, AppError> {
    let phone = flow.verify().await?;
    let auth = api.login_by_phone(&PhoneLoginRequest { phone }).await?;
    flow.close();
    info!("Employer logged in by phone");
    store_session(session, auth)
}

pub fn logout(session: &SessionStore) -> Result<(), AppError> {
    session.clear()?;
    Ok(())
}

/// Probes the backend with the stored token. A failed probe means the token
/// is no longer usable, so it is discarded.
pub async fn resolve_current_user(
    session: &SessionStore,
    api: &dyn EmployerApi,
) -> Result<UserProfile, AppError> {
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized);
    }

    match api.current_user().await {
        Ok(user) => Ok(user),
        Err(e) => {
            warn!("Session probe failed, clearing token: {e}");
            if let Err(e) = session.clear() {
                warn!("Failed to clear session token: {e}");
            }
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api_client::fake::{FakeApi, Outcome};
    use crate::api_client::OtpPurpose;
    use crate::storage::MemoryStore;
    use crate::sync::{PortalEvent, SyncChannel};

    fn session() -> (SessionStore, SyncChannel) {
        let sync = SyncChannel::new();
        (SessionStore::new(Arc::new(MemoryStore::new()), sync.clone()), sync)
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            company_name: "Acme Hiring".into(),
            name: "Asha Rao".into(),
            email: "asha@acme.in".into(),
            phone: "98765-43210".into(),
            password: "s3cret-pass".into(),
            confirm_password: "s3cret-pass".into(),
        }
    }

    #[test]
    fn test_registration_rules() {
        assert!(registration().validate().is_ok());

        let err = RegistrationForm {
            password: "short".into(),
            confirm_password: "other".into(),
            phone: "12345".into(),
            ..registration()
        }
        .validate()
        .unwrap_err()
        .toast_message();
        assert!(err.contains("Passwords do not match"));
        assert!(err.contains("at least 8 characters"));
        assert!(err.contains("10-digit mobile"));
    }

    #[test]
    fn test_login_rules() {
        let form = LoginForm {
            email: "asha@acme.in".into(),
            password: String::new(),
        };
        assert_eq!(
            form.validate().unwrap_err().toast_message(),
            "Password is required"
        );
    }

    #[tokio::test]
    async fn test_register_stores_token_and_broadcasts() {
        let api = FakeApi::new();
        let (session, sync) = session();
        let mut events = sync.subscribe();

        register(&session, api.as_ref(), &registration()).await.unwrap();
        assert_eq!(session.token().as_deref(), Some("fake-token"));
        assert_eq!(
            events.try_recv(),
            Some(PortalEvent::AuthStateChanged {
                token: Some("fake-token".into())
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_registration_never_reaches_backend() {
        let api = FakeApi::new();
        let (session, _) = session();
        let form = RegistrationForm {
            email: "not-an-email".into(),
            ..registration()
        };
        assert!(register(&session, api.as_ref(), &form).await.is_err());
        assert!(api.calls().is_empty());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_existing_account_maps_to_already_registered() {
        let api = FakeApi::new();
        FakeApi::set(&api.auth, Outcome::Exists);
        let (session, _) = session();
        let err = register(&session, api.as_ref(), &registration())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyRegistered(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_phone_login_after_otp() {
        let api = FakeApi::new();
        let (session, _) = session();
        let flow = OtpFlow::new(api.clone(), OtpPurpose::Login, 30);
        flow.open(Some("9876543210")).await.unwrap();
        flow.input_code("123456").unwrap();

        complete_phone_login(&session, api.as_ref(), &flow)
            .await
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(api.count("login_by_phone"), 1);
        assert_eq!(flow.state(), crate::otp::OtpState::Idle);
    }

    #[tokio::test]
    async fn test_failed_probe_clears_token() {
        let api = FakeApi::new();
        let (session, _) = session();
        assert!(matches!(
            resolve_current_user(&session, api.as_ref()).await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(api.count("current_user"), 0);

        session.set_token("expired").unwrap();
        assert!(matches!(
            resolve_current_user(&session, api.as_ref()).await,
            Err(AppError::Unauthorized)
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_broadcasts_signed_out() {
        let (session, sync) = session();
        session.set_token("jwt").unwrap();
        let mut events = sync.subscribe();
        logout(&session).unwrap();
        assert_eq!(
            events.try_recv(),
            Some(PortalEvent::AuthStateChanged { token: None })
        );
    }
}
