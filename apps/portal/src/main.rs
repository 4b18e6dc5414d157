mod api_client;
mod auth;
mod cart;
mod catalog;
mod checkout;
mod config;
mod dashboard;
mod errors;
mod otp;
mod routes;
mod session;
mod state;
mod storage;
mod sync;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{BackendClient, EmployerApi, OtpPurpose};
use crate::cart::CartStore;
use crate::checkout::CheckoutOrchestrator;
use crate::config::Config;
use crate::otp::OtpFlow;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::storage::{FileStore, KeyValueStore, CART_KEY};
use crate::sync::{StorageWatcher, SyncChannel, WatcherHandle};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recruiter portal v{}", env!("CARGO_PKG_VERSION"));

    // Persistence medium
    let store = FileStore::open(&config.storage_dir)?;
    info!("Storage directory: {}", store.dir().display());
    let storage: Arc<dyn KeyValueStore> = Arc::new(store);

    // Sync channel, plus the polling fallback for writes made outside this process
    let sync = SyncChannel::new();
    let _cart_watcher: WatcherHandle = StorageWatcher::spawn(
        storage.clone(),
        CART_KEY,
        config.cart_poll_interval,
        sync.clone(),
    );
    info!(
        "Cart storage polled every {}ms",
        config.cart_poll_interval.as_millis()
    );

    let session = SessionStore::new(storage.clone(), sync.clone());
    let cart = CartStore::new(storage, sync.clone());

    // REST backend client
    let api: Arc<dyn EmployerApi> = Arc::new(BackendClient::new(
        &config.backend_api_url,
        config.http_timeout,
        session.clone(),
    )?);
    info!("Backend client initialized ({})", config.backend_api_url);

    let checkout = CheckoutOrchestrator::new(
        api.clone(),
        session.clone(),
        config.checkout_terminal(),
        config.register_route.clone(),
        config.otp_resend_seconds,
    );
    let phone_login = OtpFlow::new(api.clone(), OtpPurpose::Login, config.otp_resend_seconds);

    // Build app state
    let state = AppState {
        config: config.clone(),
        sync,
        cart,
        session,
        api,
        checkout,
        phone_login,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS to the rendering layer's origin
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
