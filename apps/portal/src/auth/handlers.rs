use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::{LoginForm, RegistrationForm};
use crate::api_client::UserProfile;
use crate::errors::AppError;
use crate::otp::handlers::{self as otp, CodeRequest, MobileRequest, OpenOtpRequest};
use crate::otp::OtpView;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: UserProfile,
}

impl From<UserProfile> for SessionResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            authenticated: true,
            user,
        }
    }
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let user = super::register(&state.session, state.api.as_ref(), &form).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionResponse>, AppError> {
    let user = super::login(&state.session, state.api.as_ref(), &form).await?;
    Ok(Json(user.into()))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    super::logout(&state.session)?;
    state.phone_login.close();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let user = super::resolve_current_user(&state.session, state.api.as_ref()).await?;
    Ok(Json(user.into()))
}

/// POST /api/v1/auth/phone/open
pub async fn handle_phone_open(
    State(state): State<AppState>,
    req: Option<Json<OpenOtpRequest>>,
) -> Result<Json<OtpView>, AppError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    otp::open(&state.phone_login, req).await
}

/// POST /api/v1/auth/phone/send
pub async fn handle_phone_send(
    State(state): State<AppState>,
    req: Option<Json<MobileRequest>>,
) -> Result<Json<OtpView>, AppError> {
    otp::send(&state.phone_login, req.map(|Json(r)| r)).await
}

/// POST /api/v1/auth/phone/code
pub async fn handle_phone_code(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<OtpView>, AppError> {
    otp::input_code(&state.phone_login, req)
}

/// POST /api/v1/auth/phone/resend
pub async fn handle_phone_resend(State(state): State<AppState>) -> Result<Json<OtpView>, AppError> {
    otp::resend(&state.phone_login).await
}

/// POST /api/v1/auth/phone/verify
pub async fn handle_phone_verify(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let user =
        super::complete_phone_login(&state.session, state.api.as_ref(), &state.phone_login).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/auth/phone
pub async fn handle_phone_close(State(state): State<AppState>) -> Json<OtpView> {
    state.phone_login.close();
    Json(state.phone_login.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::fake::{FakeApi, Outcome};
    use crate::otp::OtpState;

    #[tokio::test]
    async fn test_phone_login_over_handlers() {
        let api = FakeApi::with_profile(UserProfile {
            id: "u1".into(),
            ..UserProfile::default()
        });
        let state = AppState::for_tests(api.clone());

        let Json(view) = handle_phone_open(
            State(state.clone()),
            Some(Json(OpenOtpRequest {
                mobile: Some("9876543210".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(view.state, OtpState::AwaitingCode);

        handle_phone_code(
            State(state.clone()),
            Json(CodeRequest {
                code: "123456".into(),
            }),
        )
        .await
        .unwrap();
        let Json(resp) = handle_phone_verify(State(state.clone())).await.unwrap();
        assert!(resp.authenticated);

        let Json(me) = handle_me(State(state.clone())).await.unwrap();
        assert_eq!(me.user.id, "u1");

        assert_eq!(
            handle_logout(State(state.clone())).await.unwrap(),
            StatusCode::NO_CONTENT
        );
        assert!(matches!(
            handle_me(State(state)).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_unregistered_phone_login() {
        let api = FakeApi::new();
        FakeApi::set(&api.otp_generate, Outcome::NotRegistered);
        let state = AppState::for_tests(api);

        let err = handle_phone_send(
            State(state.clone()),
            Some(Json(MobileRequest {
                mobile: "9876543210".into(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.toast_message(),
            "This mobile number is not registered. Please register first."
        );

        let Json(view) = handle_phone_close(State(state)).await;
        assert_eq!(view.state, OtpState::Idle);
        assert!(view.mobile_number.is_empty());
    }
}
