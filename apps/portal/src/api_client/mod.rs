//! REST backend client. Every backend call goes through here.
//!
//! Handlers and flows depend on the `EmployerApi` trait, never on reqwest
//! directly, so tests swap in `FakeApi`.
//!
//! No call is retried automatically: every retry is a user re-click.

use async_trait::async_trait;
use thiserror::Error;

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::BackendClient;
pub use types::*;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        user_not_found: bool,
        user_exists: bool,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
impl BackendError {
    /// Convenience for building an API error without registration flags.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackendError::Api {
            status,
            message: message.into(),
            user_not_found: false,
            user_exists: false,
        }
    }
}

#[async_trait]
pub trait EmployerApi: Send + Sync {
    /// POST /api/otp/generate
    async fn generate_otp(
        &self,
        req: &OtpGenerateRequest,
    ) -> Result<OtpGenerateResponse, BackendError>;

    /// POST /api/otp/verify
    async fn verify_otp(&self, req: &OtpVerifyRequest) -> Result<(), BackendError>;

    /// POST /api/auth/employer/register
    async fn register_employer(&self, req: &RegisterRequest) -> Result<AuthResponse, BackendError>;

    /// POST /api/auth/employer/login
    async fn login_employer(&self, req: &LoginRequest) -> Result<AuthResponse, BackendError>;

    /// POST /api/auth/login-by-phone
    async fn login_by_phone(&self, req: &PhoneLoginRequest) -> Result<AuthResponse, BackendError>;

    /// GET /api/user/me
    async fn current_user(&self) -> Result<UserProfile, BackendError>;

    /// PUT /api/user/me
    async fn update_current_user(&self, req: &ProfileUpdate) -> Result<UserProfile, BackendError>;

    /// GET /api/jobs/my/jobs
    async fn my_jobs(&self) -> Result<Vec<JobPosting>, BackendError>;

    /// POST /api/jobs
    async fn create_job(&self, job: &JobPayload) -> Result<JobPosting, BackendError>;

    /// PUT /api/jobs/:id
    async fn update_job(&self, id: &str, job: &JobPayload) -> Result<JobPosting, BackendError>;

    /// PUT /api/jobs/applications/status
    async fn update_application_status(
        &self,
        req: &ApplicationStatusUpdate,
    ) -> Result<(), BackendError>;

    /// GET /api/jobs/applications/:jobId/:appId/{view,download}-resume
    async fn application_resume(
        &self,
        job_id: &str,
        application_id: &str,
        mode: DocumentMode,
    ) -> Result<Document, BackendError>;

    /// GET /api/cv/recruiter/cvs
    async fn recruiter_cvs(&self) -> Result<Vec<CvRecord>, BackendError>;

    /// GET /api/cv/recruiter/cvs/:id/{view,download}
    async fn recruiter_cv(&self, id: &str, mode: DocumentMode) -> Result<Document, BackendError>;

    /// POST /api/user/recruiter/apply-public
    async fn submit_sales_enquiry(&self, req: &SalesEnquiry) -> Result<(), BackendError>;
}
