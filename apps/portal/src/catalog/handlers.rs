use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use super::plans::{Plan, FREE_PLAN, PLANS};
use crate::api_client::{ProfileUpdate, UserProfile};
use crate::errors::AppError;
use crate::state::AppState;
use crate::sync::PortalEvent;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub plan: &'static str,
    pub user: UserProfile,
}

/// GET /api/v1/plans
pub async fn handle_list_plans() -> Json<&'static [Plan]> {
    Json(PLANS)
}

/// POST /api/v1/plans/free/activate
pub async fn handle_activate_free(
    State(state): State<AppState>,
) -> Result<Json<ActivationResponse>, AppError> {
    if !state.session.is_authenticated() {
        return Err(AppError::Unauthorized);
    }

    let update = ProfileUpdate {
        plan: Some(FREE_PLAN.to_string()),
        ..ProfileUpdate::default()
    };
    let user = state.api.update_current_user(&update).await?;
    state.sync.publish(PortalEvent::UserDataUpdated);
    info!("Free plan activated");

    Ok(Json(ActivationResponse {
        plan: FREE_PLAN,
        user,
    }))
}
