use axum::{extract::State, Json};
use serde::Deserialize;

use super::{CheckoutHandoff, CheckoutView, PaymentDetails, UserType, UserTypeOutcome};
use crate::errors::AppError;
use crate::otp::handlers::{self as otp, CodeRequest, MobileRequest};
use crate::otp::OtpView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub plan: String,
}

#[derive(Debug, Deserialize)]
pub struct UserTypeRequest {
    pub choice: UserType,
    /// Seed for the OTP modal, e.g. the number typed on the plans page.
    #[serde(default)]
    pub mobile: Option<String>,
}

/// GET /api/v1/checkout
pub async fn handle_get_checkout(State(state): State<AppState>) -> Json<CheckoutView> {
    Json(state.checkout.view())
}

/// DELETE /api/v1/checkout
pub async fn handle_cancel_checkout(State(state): State<AppState>) -> Json<CheckoutView> {
    state.checkout.cancel();
    Json(state.checkout.view())
}

/// POST /api/v1/checkout/start
pub async fn handle_start_checkout(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<CheckoutView>, AppError> {
    Ok(Json(state.checkout.start(&req.plan)?))
}

/// POST /api/v1/checkout/user-type
pub async fn handle_choose_user_type(
    State(state): State<AppState>,
    Json(req): Json<UserTypeRequest>,
) -> Result<Json<UserTypeOutcome>, AppError> {
    let outcome = state
        .checkout
        .choose_user_type(req.choice, req.mobile.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/checkout/otp/mobile
pub async fn handle_checkout_otp_mobile(
    State(state): State<AppState>,
    Json(req): Json<MobileRequest>,
) -> Result<Json<OtpView>, AppError> {
    otp::set_mobile(state.checkout.otp(), req)
}

/// POST /api/v1/checkout/otp/send
pub async fn handle_checkout_otp_send(
    State(state): State<AppState>,
    req: Option<Json<MobileRequest>>,
) -> Result<Json<OtpView>, AppError> {
    otp::send(state.checkout.otp(), req.map(|Json(r)| r)).await
}

/// POST /api/v1/checkout/otp/code
pub async fn handle_checkout_otp_code(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<OtpView>, AppError> {
    otp::input_code(state.checkout.otp(), req)
}

/// POST /api/v1/checkout/otp/resend
pub async fn handle_checkout_otp_resend(
    State(state): State<AppState>,
) -> Result<Json<OtpView>, AppError> {
    otp::resend(state.checkout.otp()).await
}

/// POST /api/v1/checkout/otp/verify
pub async fn handle_checkout_otp_verify(
    State(state): State<AppState>,
) -> Result<Json<CheckoutView>, AppError> {
    Ok(Json(state.checkout.verify_otp().await?))
}

/// POST /api/v1/checkout/details
pub async fn handle_submit_details(
    State(state): State<AppState>,
    Json(details): Json<PaymentDetails>,
) -> Result<Json<CheckoutHandoff>, AppError> {
    Ok(Json(state.checkout.submit_details(details)?))
}
