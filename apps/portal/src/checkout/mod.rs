//! Plan purchase orchestrator.
//!
//! A strictly linear sequence: user-type choice → OTP verification →
//! payment details → hand-off. Cancelling at any step drops everything
//! held (selected plan, verified number, pre-fill); there is no resume.
//!
//! The terminal action is a constructor parameter so the dashboard, the
//! plans page and the login page all share this one state machine.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api_client::{EmployerApi, OtpPurpose};
use crate::catalog::{find_plan, Plan};
use crate::errors::AppError;
use crate::otp::{OtpFlow, OtpView};
use crate::session::SessionStore;

pub mod handlers;
pub mod payment_details;

pub use payment_details::PaymentDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutStep {
    Closed,
    UserType,
    OtpVerification,
    PaymentDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    New,
    Existing,
}

/// What happens once payment details are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTerminal {
    /// Navigate to an external checkout route.
    Navigate { route: String },
    /// Hand the details to an inline payment component.
    InlinePayment,
}

impl CheckoutTerminal {
    pub fn redirect(&self) -> Option<String> {
        match self {
            CheckoutTerminal::Navigate { route } => Some(route.clone()),
            CheckoutTerminal::InlinePayment => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPlan {
    pub name: String,
    pub price: String,
    pub amount: u64,
    pub period: String,
}

impl From<&Plan> for SelectedPlan {
    fn from(plan: &Plan) -> Self {
        Self {
            name: plan.name.to_string(),
            price: plan.price.to_string(),
            amount: plan.resolved_price(),
            period: plan.period.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutHandoff {
    pub reference: Uuid,
    pub plan: SelectedPlan,
    pub form_data: PaymentDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum UserTypeOutcome {
    /// New employers leave the flow for registration.
    Redirect { route: String },
    Continue { view: CheckoutView },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub selected_plan: Option<SelectedPlan>,
    pub verified_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDetails>,
}

#[derive(Debug)]
struct Held {
    step: CheckoutStep,
    selected_plan: Option<SelectedPlan>,
    verified_mobile: Option<String>,
    prefill: Option<PaymentDetails>,
    epoch: u64,
}

impl Held {
    fn closed(epoch: u64) -> Self {
        Self {
            step: CheckoutStep::Closed,
            selected_plan: None,
            verified_mobile: None,
            prefill: None,
            epoch,
        }
    }
}

struct Inner {
    api: Arc<dyn EmployerApi>,
    session: SessionStore,
    otp: OtpFlow,
    terminal: CheckoutTerminal,
    register_route: String,
    held: Arc<Mutex<Held>>,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    inner: Arc<Inner>,
}

fn lock(held: &Mutex<Held>) -> MutexGuard<'_, Held> {
    held.lock().unwrap_or_else(|e| e.into_inner())
}

impl CheckoutOrchestrator {
    pub fn new(
        api: Arc<dyn EmployerApi>,
        session: SessionStore,
        terminal: CheckoutTerminal,
        register_route: impl Into<String>,
        resend_seconds: u32,
    ) -> Self {
        let held = Arc::new(Mutex::new(Held::closed(0)));
        let otp = OtpFlow::new(api.clone(), OtpPurpose::Payment, resend_seconds);

        // the OTP modal reports its verified number back through this callback
        let weak: Weak<Mutex<Held>> = Arc::downgrade(&held);
        otp.set_on_verified(Some(Arc::new(move |mobile: &str| {
            if let Some(held) = weak.upgrade() {
                let mut held = lock(&held);
                if held.step == CheckoutStep::OtpVerification {
                    held.verified_mobile = Some(mobile.to_string());
                }
            }
        })));

        Self {
            inner: Arc::new(Inner {
                api,
                session,
                otp,
                terminal,
                register_route: register_route.into(),
                held,
            }),
        }
    }

    pub fn otp(&self) -> &OtpFlow {
        &self.inner.otp
    }

    pub fn view(&self) -> CheckoutView {
        let held = lock(&self.inner.held);
        CheckoutView {
            step: held.step,
            selected_plan: held.selected_plan.clone(),
            verified_mobile: held.verified_mobile.clone(),
            otp: (held.step == CheckoutStep::OtpVerification).then(|| self.inner.otp.view()),
            payment_details: held.prefill.clone(),
        }
    }

    /// Closes every step and forgets everything held.
    pub fn cancel(&self) {
        self.inner.otp.close();
        let mut held = lock(&self.inner.held);
        let epoch = held.epoch.wrapping_add(1);
        *held = Held::closed(epoch);
        debug!("Checkout cancelled");
    }

    fn require_step(&self, expected: CheckoutStep) -> Result<MutexGuard<'_, Held>, AppError> {
        let held = lock(&self.inner.held);
        if held.step != expected {
            return Err(AppError::invalid_state(format!(
                "Checkout is not at the {expected:?} step"
            )));
        }
        Ok(held)
    }

    /// Step 1: a paid plan was picked. Restarts any flow already open.
    pub fn start(&self, plan_name: &str) -> Result<CheckoutView, AppError> {
        let plan = find_plan(plan_name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown plan '{plan_name}'")))?;
        if plan.is_contact_sales() {
            return Err(AppError::validation(format!(
                "Please contact sales for {} pricing",
                plan.name
            )));
        }
        if !plan.is_paid() {
            return Err(AppError::validation(format!(
                "The {} plan does not require payment",
                plan.name
            )));
        }

        self.cancel();
        {
            let mut held = lock(&self.inner.held);
            held.step = CheckoutStep::UserType;
            held.selected_plan = Some(SelectedPlan::from(plan));
        }
        info!("Checkout started for {}", plan.name);
        Ok(self.view())
    }

    /// Step 2. "new" leaves the flow; "existing" opens the OTP modal,
    /// auto-sending when `mobile` is already a valid number.
    pub async fn choose_user_type(
        &self,
        choice: UserType,
        mobile: Option<&str>,
    ) -> Result<UserTypeOutcome, AppError> {
        {
            let mut held = self.require_step(CheckoutStep::UserType)?;
            if choice == UserType::Existing {
                held.step = CheckoutStep::OtpVerification;
            }
        }

        match choice {
            UserType::New => {
                self.cancel();
                Ok(UserTypeOutcome::Redirect {
                    route: self.inner.register_route.clone(),
                })
            }
            UserType::Existing => {
                self.inner.otp.open(mobile).await?;
                Ok(UserTypeOutcome::Continue { view: self.view() })
            }
        }
    }

    /// Step 3: verify the code, then move to payment details pre-filled
    /// from the signed-in profile when there is one.
    pub async fn verify_otp(&self) -> Result<CheckoutView, AppError> {
        let epoch = self.require_step(CheckoutStep::OtpVerification)?.epoch;

        let mobile = self.inner.otp.verify().await?;

        let profile = if self.inner.session.is_authenticated() {
            match self.inner.api.current_user().await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    debug!("No profile for pre-fill: {e}");
                    None
                }
            }
        } else {
            None
        };

        {
            let mut held = lock(&self.inner.held);
            if held.epoch != epoch || held.step != CheckoutStep::OtpVerification {
                return Err(AppError::invalid_state("The checkout was cancelled"));
            }
            let verified = held.verified_mobile.clone().unwrap_or(mobile);
            held.prefill = Some(PaymentDetails::prefill(profile.as_ref(), Some(&verified)));
            held.verified_mobile = Some(verified);
            held.step = CheckoutStep::PaymentDetails;
        }
        self.inner.otp.close();
        Ok(self.view())
    }

    /// Step 4: validated details produce the hand-off and close the flow.
    pub fn submit_details(&self, details: PaymentDetails) -> Result<CheckoutHandoff, AppError> {
        let plan = {
            let held = self.require_step(CheckoutStep::PaymentDetails)?;
            details.validate()?;
            held.selected_plan
                .clone()
                .ok_or_else(|| AppError::invalid_state("No plan selected"))?
        };

        let handoff = CheckoutHandoff {
            reference: Uuid::new_v4(),
            plan,
            form_data: details,
            redirect: self.inner.terminal.redirect(),
        };

        self.cancel();
        info!(
            "Checkout hand-off {} for {}",
            handoff.reference, handoff.plan.name
        );
        Ok(handoff)
    }
}
