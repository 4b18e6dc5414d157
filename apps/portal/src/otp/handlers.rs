//! Request bodies and shared handler bodies for the OTP modal endpoints.
//!
//! Both the checkout flow and phone login mount an OTP modal; their route
//! handlers pick the right `OtpFlow` and delegate here.

use axum::Json;
use serde::Deserialize;

use super::{OtpFlow, OtpView};
use crate::errors::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct OpenOtpRequest {
    #[serde(default)]
    pub mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MobileRequest {
    pub mobile: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

pub async fn open(flow: &OtpFlow, req: OpenOtpRequest) -> Result<Json<OtpView>, AppError> {
    Ok(Json(flow.open(req.mobile.as_deref()).await?))
}

pub fn set_mobile(flow: &OtpFlow, req: MobileRequest) -> Result<Json<OtpView>, AppError> {
    Ok(Json(flow.set_mobile(&req.mobile)?))
}

/// Accepts an optional number so "type and submit" is one request.
pub async fn send(flow: &OtpFlow, req: Option<MobileRequest>) -> Result<Json<OtpView>, AppError> {
    if let Some(req) = req {
        flow.set_mobile(&req.mobile)?;
    }
    Ok(Json(flow.send().await?))
}

pub fn input_code(flow: &OtpFlow, req: CodeRequest) -> Result<Json<OtpView>, AppError> {
    Ok(Json(flow.input_code(&req.code)?))
}

pub async fn resend(flow: &OtpFlow) -> Result<Json<OtpView>, AppError> {
    Ok(Json(flow.resend().await?))
}
