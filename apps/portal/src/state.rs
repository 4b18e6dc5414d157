use std::sync::Arc;

use crate::api_client::EmployerApi;
use crate::cart::CartStore;
use crate::checkout::CheckoutOrchestrator;
use crate::config::Config;
use crate::otp::OtpFlow;
use crate::session::SessionStore;
use crate::sync::SyncChannel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sync: SyncChannel,
    pub cart: CartStore,
    pub session: SessionStore,
    /// REST backend. `BackendClient` in production.
    pub api: Arc<dyn EmployerApi>,
    /// Plan purchase flow with its own payment OTP modal.
    pub checkout: CheckoutOrchestrator,
    /// OTP modal of the phone login page.
    pub phone_login: OtpFlow,
}

#[cfg(test)]
impl AppState {
    /// In-memory state wired to a scripted backend.
    pub fn for_tests(api: Arc<crate::api_client::fake::FakeApi>) -> Self {
        use crate::api_client::OtpPurpose;
        use crate::storage::MemoryStore;

        let config = Config::for_tests();
        let storage = Arc::new(MemoryStore::new());
        let sync = SyncChannel::new();
        let session = SessionStore::new(storage.clone(), sync.clone());
        let checkout = CheckoutOrchestrator::new(
            api.clone(),
            session.clone(),
            config.checkout_terminal(),
            config.register_route.clone(),
            config.otp_resend_seconds,
        );
        let phone_login = OtpFlow::new(api.clone(), OtpPurpose::Login, config.otp_resend_seconds);

        AppState {
            cart: CartStore::new(storage, sync.clone()),
            session,
            api,
            checkout,
            phone_login,
            sync,
            config,
        }
    }
}
