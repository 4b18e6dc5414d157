//! OTP verification flow.
//!
//! ```text
//! Idle ──send──▶ Sending ──ok──▶ AwaitingCode ──verify──▶ Verifying ──ok──▶ Verified
//!   ▲              │ err            │   ▲    resend (countdown == 0)  │ err
//!   └──────────────┘                │   └─────────────────────────────┘
//!                                   └──resend──▶ Sending
//! ```
//!
//! Failures are not a state: the flow returns to the interactive state it
//! left and the error is handed back for a toast.
//!
//! The session lock is never held across a backend call. Each call
//! captures the session epoch first; `open` and `close` bump it, so a
//! response that arrives after the user closed the modal is dropped.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::api_client::{
    EmployerApi, IdentifierType, OtpGenerateRequest, OtpPurpose, OtpVerifyRequest,
};
use crate::errors::{AppError, GENERIC_FAILURE};
use crate::validation::{clean_mobile, is_complete_otp, is_valid_mobile, sanitize_otp_input};

pub mod handlers;

pub const DEFAULT_RESEND_SECONDS: u32 = 30;

const INVALID_MOBILE: &str = "Please enter a valid 10-digit mobile number";
const NOT_REGISTERED: &str = "This mobile number is not registered. Please register first.";
const SEND_FAILED: &str = "Failed to send OTP. Please try again.";
const INCOMPLETE_CODE: &str = "Please enter the 6-digit OTP";
const VERIFY_FAILED: &str = "Invalid OTP. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OtpState {
    Idle,
    Sending,
    AwaitingCode,
    Verifying,
    Verified,
}

/// Invoked with the cleaned mobile number once verification succeeds.
pub type VerifiedCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone)]
struct OtpSession {
    state: OtpState,
    mobile_number: String,
    code: String,
    otp_sent: bool,
    otp_verified: bool,
    resend_countdown: u32,
    dev_otp: Option<String>,
    epoch: u64,
}

impl OtpSession {
    fn fresh(epoch: u64) -> Self {
        Self {
            state: OtpState::Idle,
            mobile_number: String::new(),
            code: String::new(),
            otp_sent: false,
            otp_verified: false,
            resend_countdown: 0,
            dev_otp: None,
            epoch,
        }
    }
}

/// Serializable snapshot for the rendering layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OtpView {
    pub purpose: OtpPurpose,
    pub state: OtpState,
    pub mobile_number: String,
    pub code: String,
    pub otp_sent: bool,
    pub otp_verified: bool,
    pub resend_countdown: u32,
    pub can_resend: bool,
    /// Only populated when the backend runs in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_otp: Option<String>,
}

struct Inner {
    api: Arc<dyn EmployerApi>,
    purpose: OtpPurpose,
    resend_seconds: u32,
    session: Mutex<OtpSession>,
    countdown: Mutex<Option<JoinHandle<()>>>,
    on_verified: Mutex<Option<VerifiedCallback>>,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, OtpSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_countdown(&self) {
        let mut slot = self.countdown.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }

    /// One countdown step. Returns whether the driver should keep going.
    /// Keeps running while a code is being verified, since a failed verify
    /// drops back to `AwaitingCode`.
    fn tick(&self, epoch: u64) -> bool {
        let mut session = self.session();
        if session.epoch != epoch
            || !matches!(session.state, OtpState::AwaitingCode | OtpState::Verifying)
        {
            return false;
        }
        session.resend_countdown = session.resend_countdown.saturating_sub(1);
        debug!("OTP resend countdown: {}s", session.resend_countdown);
        session.resend_countdown > 0
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_countdown();
    }
}

/// Marks a backend call in flight. If the request future is dropped before
/// the response is applied, the session goes back to `restore`.
struct InFlight<'a> {
    inner: &'a Inner,
    epoch: u64,
    busy: OtpState,
    restore: OtpState,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn begin(inner: &'a Inner, session: &mut OtpSession, busy: OtpState, restore: OtpState) -> Self {
        session.state = busy;
        Self {
            inner,
            epoch: session.epoch,
            busy,
            restore,
            armed: true,
        }
    }

    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.inner.session();
        if session.epoch == self.epoch && session.state == self.busy {
            warn!("OTP request abandoned, back to {:?}", self.restore);
            session.state = self.restore;
        }
    }
}

/// A cheaply clonable handle on one OTP modal instance.
#[derive(Clone)]
pub struct OtpFlow {
    inner: Arc<Inner>,
}

impl OtpFlow {
    pub fn new(api: Arc<dyn EmployerApi>, purpose: OtpPurpose, resend_seconds: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                purpose,
                resend_seconds,
                session: Mutex::new(OtpSession::fresh(0)),
                countdown: Mutex::new(None),
                on_verified: Mutex::new(None),
            }),
        }
    }

    pub fn set_on_verified(&self, callback: Option<VerifiedCallback>) {
        *self
            .inner
            .on_verified
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = callback;
    }

    pub fn view(&self) -> OtpView {
        let session = self.inner.session();
        OtpView {
            purpose: self.inner.purpose,
            state: session.state,
            mobile_number: session.mobile_number.clone(),
            code: session.code.clone(),
            otp_sent: session.otp_sent,
            otp_verified: session.otp_verified,
            resend_countdown: session.resend_countdown,
            can_resend: session.state == OtpState::AwaitingCode && session.resend_countdown == 0,
            dev_otp: session.dev_otp.clone(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> OtpState {
        self.inner.session().state
    }

    /// Starts a fresh session. A seed that already passes validation is
    /// sent immediately; any other seed is just pre-filled.
    pub async fn open(&self, seed_mobile: Option<&str>) -> Result<OtpView, AppError> {
        let seed = seed_mobile.map(clean_mobile).unwrap_or_default();
        let auto_send = is_valid_mobile(&seed);
        {
            let mut session = self.reset();
            session.mobile_number = seed;
        }

        if auto_send {
            debug!("OTP flow opened with a valid seed, sending immediately");
            return self.send().await;
        }
        Ok(self.view())
    }

    /// Resets every field. Any in-flight response will be ignored.
    pub fn close(&self) {
        drop(self.reset());
    }

    fn reset(&self) -> MutexGuard<'_, OtpSession> {
        self.inner.stop_countdown();
        let mut session = self.inner.session();
        let epoch = session.epoch.wrapping_add(1);
        *session = OtpSession::fresh(epoch);
        session
    }

    pub fn set_mobile(&self, input: &str) -> Result<OtpView, AppError> {
        {
            let mut session = self.inner.session();
            if session.state != OtpState::Idle {
                return Err(AppError::invalid_state(
                    "The mobile number cannot be changed after the OTP was sent",
                ));
            }
            session.mobile_number = clean_mobile(input);
        }
        Ok(self.view())
    }

    /// Idle → Sending → AwaitingCode. Invalid numbers never reach the backend.
    pub async fn send(&self) -> Result<OtpView, AppError> {
        {
            let session = self.inner.session();
            match session.state {
                OtpState::Idle => {}
                OtpState::Sending => {
                    return Err(AppError::invalid_state("OTP request already in progress"))
                }
                OtpState::AwaitingCode => {
                    return Err(AppError::invalid_state(
                        "OTP already sent. Use resend to request a new one",
                    ))
                }
                OtpState::Verifying | OtpState::Verified => {
                    return Err(AppError::invalid_state("Mobile number already being verified"))
                }
            }
            if !is_valid_mobile(&session.mobile_number) {
                return Err(AppError::validation(INVALID_MOBILE));
            }
        }
        self.dispatch(OtpState::Idle).await
    }

    /// Only allowed once the countdown reached zero.
    pub async fn resend(&self) -> Result<OtpView, AppError> {
        {
            let session = self.inner.session();
            if session.state != OtpState::AwaitingCode {
                return Err(AppError::invalid_state("No OTP has been sent yet"));
            }
            if session.resend_countdown > 0 {
                return Err(AppError::invalid_state(format!(
                    "Please wait {}s before requesting a new OTP",
                    session.resend_countdown
                )));
            }
        }
        self.dispatch(OtpState::AwaitingCode).await
    }

    async fn dispatch(&self, return_to: OtpState) -> Result<OtpView, AppError> {
        let (in_flight, epoch, mobile) = {
            let mut session = self.inner.session();
            let in_flight =
                InFlight::begin(&self.inner, &mut session, OtpState::Sending, return_to);
            (in_flight, session.epoch, session.mobile_number.clone())
        };

        let request = OtpGenerateRequest {
            identifier: mobile.clone(),
            kind: IdentifierType::Phone,
            purpose: self.inner.purpose,
        };
        let result = self.inner.api.generate_otp(&request).await;
        in_flight.finish();

        let mut session = self.inner.session();
        if session.epoch != epoch {
            warn!("Ignoring OTP dispatch response for a closed session");
            return Err(AppError::invalid_state("The verification was cancelled"));
        }

        let response = match result {
            Ok(response) if response.user_not_found => {
                session.state = return_to;
                return Err(AppError::NotRegistered(NOT_REGISTERED.to_string()));
            }
            Ok(response) => response,
            Err(e) => {
                session.state = return_to;
                return Err(match AppError::from(e) {
                    AppError::NotRegistered(_) => AppError::NotRegistered(NOT_REGISTERED.to_string()),
                    AppError::Backend { status, message } if message == GENERIC_FAILURE => {
                        AppError::Backend {
                            status,
                            message: SEND_FAILED.to_string(),
                        }
                    }
                    other => other,
                });
            }
        };

        if let Some(otp) = &response.otp {
            debug!("Development OTP for {mobile}: {otp}");
        }
        if let Some(message) = &response.message {
            debug!("OTP dispatch: {message}");
        }
        session.state = OtpState::AwaitingCode;
        session.otp_sent = true;
        session.resend_countdown = self.inner.resend_seconds;
        session.dev_otp = response.otp;
        drop(session);

        info!("OTP sent ({:?})", self.inner.purpose);
        self.start_countdown(epoch);
        Ok(self.view())
    }

    fn start_countdown(&self, epoch: u64) {
        self.inner.stop_countdown();
        if self.inner.resend_seconds == 0 {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = Duration::from_secs(1);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if !inner.tick(epoch) {
                    break;
                }
            }
        });

        *self
            .inner
            .countdown
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(task);
    }

    /// Stores the typed code: digits only, at most six.
    pub fn input_code(&self, raw: &str) -> Result<OtpView, AppError> {
        {
            let mut session = self.inner.session();
            if session.state != OtpState::AwaitingCode {
                return Err(AppError::invalid_state("No OTP is awaiting entry"));
            }
            session.code = sanitize_otp_input(raw);
        }
        Ok(self.view())
    }

    /// AwaitingCode → Verifying → Verified. Returns the verified number.
    pub async fn verify(&self) -> Result<String, AppError> {
        let (in_flight, epoch, mobile, code) = {
            let mut session = self.inner.session();
            match session.state {
                OtpState::AwaitingCode => {}
                OtpState::Verifying => {
                    return Err(AppError::invalid_state("Verification already in progress"))
                }
                OtpState::Verified => return Ok(session.mobile_number.clone()),
                OtpState::Idle | OtpState::Sending => {
                    return Err(AppError::invalid_state("No OTP has been sent yet"))
                }
            }
            if !is_complete_otp(&session.code) {
                return Err(AppError::validation(INCOMPLETE_CODE));
            }
            let in_flight = InFlight::begin(
                &self.inner,
                &mut session,
                OtpState::Verifying,
                OtpState::AwaitingCode,
            );
            (
                in_flight,
                session.epoch,
                session.mobile_number.clone(),
                session.code.clone(),
            )
        };

        let request = OtpVerifyRequest {
            identifier: mobile.clone(),
            otp: code,
            kind: IdentifierType::Phone,
            purpose: self.inner.purpose,
        };
        let result = self.inner.api.verify_otp(&request).await;
        in_flight.finish();

        {
            let mut session = self.inner.session();
            if session.epoch != epoch {
                warn!("Ignoring OTP verify response for a closed session");
                return Err(AppError::invalid_state("The verification was cancelled"));
            }
            if let Err(e) = result {
                // the typed code stays so the user can correct it
                session.state = OtpState::AwaitingCode;
                return Err(match AppError::from(e) {
                    AppError::Backend { status, message } if message == GENERIC_FAILURE => {
                        AppError::Backend {
                            status,
                            message: VERIFY_FAILED.to_string(),
                        }
                    }
                    other => other,
                });
            }
            session.state = OtpState::Verified;
            session.otp_verified = true;
            session.resend_countdown = 0;
        }
        self.inner.stop_countdown();
        info!("Mobile number verified ({:?})", self.inner.purpose);

        let callback = self
            .inner
            .on_verified
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(&mobile);
        }
        Ok(mobile)
    }

    #[cfg(test)]
    fn countdown_running(&self) -> bool {
        self.inner
            .countdown
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}
