use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::checkout::CheckoutTerminal;
use crate::otp::DEFAULT_RESEND_SECONDS;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a number does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub storage_dir: PathBuf,
    pub cart_poll_interval: Duration,
    pub otp_resend_seconds: u32,
    pub checkout_route: String,
    pub register_route: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_api_url: require_env("BACKEND_API_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            storage_dir: std::env::var("STORAGE_DIR")
                .unwrap_or_else(|_| ".portal-storage".to_string())
                .into(),
            cart_poll_interval: Duration::from_millis(parse_env("CART_POLL_INTERVAL_MS", 500)?),
            otp_resend_seconds: parse_env("OTP_RESEND_SECONDS", DEFAULT_RESEND_SECONDS)?,
            checkout_route: std::env::var("CHECKOUT_ROUTE")
                .unwrap_or_else(|_| "/checkout".to_string()),
            register_route: std::env::var("REGISTER_ROUTE")
                .unwrap_or_else(|_| "/employer/register".to_string()),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    /// An empty `CHECKOUT_ROUTE` hands checkout details to an inline payment
    /// component instead of navigating.
    pub fn checkout_terminal(&self) -> CheckoutTerminal {
        let route = self.checkout_route.trim();
        if route.is_empty() {
            CheckoutTerminal::InlinePayment
        } else {
            CheckoutTerminal::Navigate {
                route: route.to_string(),
            }
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            backend_api_url: "http://backend.test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            storage_dir: PathBuf::from(".portal-storage"),
            cart_poll_interval: Duration::from_millis(500),
            otp_resend_seconds: DEFAULT_RESEND_SECONDS,
            checkout_route: "/checkout".to_string(),
            register_route: "/employer/register".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}
