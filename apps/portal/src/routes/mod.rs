pub mod events;
pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::{auth, cart, catalog, checkout, dashboard};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/events", get(events::handle_events))
        // Catalog
        .route("/api/v1/plans", get(catalog::handlers::handle_list_plans))
        .route(
            "/api/v1/plans/free/activate",
            post(catalog::handlers::handle_activate_free),
        )
        // Cart
        .route(
            "/api/v1/cart",
            get(cart::handlers::handle_get_cart).delete(cart::handlers::handle_clear_cart),
        )
        .route(
            "/api/v1/cart/summary",
            get(cart::handlers::handle_cart_summary),
        )
        .route("/api/v1/cart/items", post(cart::handlers::handle_add_item))
        .route(
            "/api/v1/cart/items/:name",
            patch(cart::handlers::handle_update_quantity)
                .delete(cart::handlers::handle_remove_item),
        )
        .route(
            "/api/v1/cart/checkout",
            post(cart::handlers::handle_cart_checkout),
        )
        // Authentication
        .route("/api/v1/auth/register", post(auth::handlers::handle_register))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        .route("/api/v1/auth/me", get(auth::handlers::handle_me))
        .route(
            "/api/v1/auth/phone",
            delete(auth::handlers::handle_phone_close),
        )
        .route(
            "/api/v1/auth/phone/open",
            post(auth::handlers::handle_phone_open),
        )
        .route(
            "/api/v1/auth/phone/send",
            post(auth::handlers::handle_phone_send),
        )
        .route(
            "/api/v1/auth/phone/code",
            post(auth::handlers::handle_phone_code),
        )
        .route(
            "/api/v1/auth/phone/verify",
            post(auth::handlers::handle_phone_verify),
        )
        .route(
            "/api/v1/auth/phone/resend",
            post(auth::handlers::handle_phone_resend),
        )
        // Checkout
        .route(
            "/api/v1/checkout",
            get(checkout::handlers::handle_get_checkout)
                .delete(checkout::handlers::handle_cancel_checkout),
        )
        .route(
            "/api/v1/checkout/start",
            post(checkout::handlers::handle_start_checkout),
        )
        .route(
            "/api/v1/checkout/user-type",
            post(checkout::handlers::handle_choose_user_type),
        )
        .route(
            "/api/v1/checkout/otp/mobile",
            post(checkout::handlers::handle_checkout_otp_mobile),
        )
        .route(
            "/api/v1/checkout/otp/send",
            post(checkout::handlers::handle_checkout_otp_send),
        )
        .route(
            "/api/v1/checkout/otp/code",
            post(checkout::handlers::handle_checkout_otp_code),
        )
        .route(
            "/api/v1/checkout/otp/verify",
            post(checkout::handlers::handle_checkout_otp_verify),
        )
        .route(
            "/api/v1/checkout/otp/resend",
            post(checkout::handlers::handle_checkout_otp_resend),
        )
        .route(
            "/api/v1/checkout/details",
            post(checkout::handlers::handle_submit_details),
        )
        // Recruiter dashboard
        .route(
            "/api/v1/jobs",
            get(dashboard::handlers::handle_list_jobs).post(dashboard::handlers::handle_create_job),
        )
        .route("/api/v1/jobs/:id", put(dashboard::handlers::handle_update_job))
        .route(
            "/api/v1/jobs/:id/applications",
            get(dashboard::handlers::handle_list_applicants),
        )
        .route(
            "/api/v1/jobs/:id/applications/:app_id/resume",
            get(dashboard::handlers::handle_application_resume),
        )
        .route(
            "/api/v1/applications/status",
            put(dashboard::handlers::handle_update_application_status),
        )
        .route("/api/v1/cvs", get(dashboard::handlers::handle_list_cvs))
        .route("/api/v1/cvs/:id/view", get(dashboard::handlers::handle_view_cv))
        .route(
            "/api/v1/cvs/:id/download",
            get(dashboard::handlers::handle_download_cv),
        )
        .route(
            "/api/v1/enquiries",
            post(dashboard::handlers::handle_submit_enquiry),
        )
        .with_state(state)
}
