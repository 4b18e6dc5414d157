use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api_client::BackendError;
use crate::storage::StorageError;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Application-level error type.
///
/// Every variant's response `message` is the toast text shown to the user.
/// Nothing here is fatal: the UI re-enables the triggering control and lets
/// the user retry.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not registered: {0}")]
    NotRegistered(String),

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Plan limit: {0}")]
    PlanLimit(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Backend error (status {status:?}): {message}")]
    Backend { status: Option<u16>, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    /// Toast text for this error.
    pub fn toast_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotRegistered(msg)
            | AppError::AlreadyRegistered(msg)
            | AppError::InvalidState(msg)
            | AppError::NotFound(msg)
            | AppError::PlanLimit(msg)
            | AppError::Backend { message: msg, .. } => msg.clone(),
            AppError::Unauthorized => "Please log in to continue".to_string(),
            AppError::Storage(_) => "Could not save your changes locally".to_string(),
            AppError::Internal(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Maps backend failures onto the taxonomy above, keeping the server's
/// message when it sent one.
impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Api {
                status,
                message,
                user_not_found,
                user_exists,
            } => {
                if user_exists {
                    AppError::AlreadyRegistered(non_empty_or(
                        message,
                        "An account with these details already exists",
                    ))
                } else if user_not_found || status == 404 {
                    AppError::NotRegistered(non_empty_or(message, "No account found"))
                } else if status == 401 {
                    AppError::Unauthorized
                } else {
                    AppError::Backend {
                        status: Some(status),
                        message: non_empty_or(message, GENERIC_FAILURE),
                    }
                }
            }
            BackendError::Http(e) => {
                tracing::warn!("Backend unreachable: {e}");
                AppError::Backend {
                    status: None,
                    message: "Unable to reach the server. Check your connection and try again."
                        .to_string(),
                }
            }
            BackendError::Parse(e) => {
                tracing::warn!("Unexpected backend response: {e}");
                AppError::Backend {
                    status: None,
                    message: GENERIC_FAILURE.to_string(),
                }
            }
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotRegistered(_) => (StatusCode::NOT_FOUND, "NOT_REGISTERED"),
            AppError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
            AppError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::PlanLimit(_) => (StatusCode::FORBIDDEN, "PLAN_LIMIT"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Backend { status, message } => {
                tracing::error!("Backend error ({status:?}): {message}");
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR")
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.toast_message()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str, not_found: bool, exists: bool) -> BackendError {
        BackendError::Api {
            status,
            message: message.to_string(),
            user_not_found: not_found,
            user_exists: exists,
        }
    }

    #[test]
    fn test_user_not_found_flag_maps_to_not_registered() {
        let err = AppError::from(api(400, "", true, false));
        assert!(matches!(err, AppError::NotRegistered(_)));
        assert_eq!(err.toast_message(), "No account found");
    }

    #[test]
    fn test_404_maps_to_not_registered() {
        let err = AppError::from(api(404, "User not found", false, false));
        assert!(matches!(err, AppError::NotRegistered(ref m) if m == "User not found"));
    }

    #[test]
    fn test_user_exists_flag() {
        let err = AppError::from(api(400, "Email already in use", false, true));
        assert!(matches!(err, AppError::AlreadyRegistered(_)));
        assert_eq!(err.toast_message(), "Email already in use");
    }

    #[test]
    fn test_server_message_preserved_else_generic() {
        let err = AppError::from(api(500, "Database unavailable", false, false));
        assert_eq!(err.toast_message(), "Database unavailable");
        let err = AppError::from(api(500, "  ", false, false));
        assert_eq!(err.toast_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_401_maps_to_unauthorized() {
        assert!(matches!(
            AppError::from(api(401, "jwt expired", false, false)),
            AppError::Unauthorized
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::invalid_state("x").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::PlanLimit("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
