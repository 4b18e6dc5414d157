//! Scripted in-memory `EmployerApi` for tests. Records every call by name.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// 404 with `userNotFound` set.
    NotRegistered,
    /// 400 with `userExists` set.
    Exists,
    /// Generic failure with this message.
    Fail(&'static str),
}

impl Outcome {
    fn to_result(&self) -> Result<(), BackendError> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::NotRegistered => Err(BackendError::Api {
                status: 404,
                message: "User not found".into(),
                user_not_found: true,
                user_exists: false,
            }),
            Outcome::Exists => Err(BackendError::Api {
                status: 400,
                message: "User already exists".into(),
                user_not_found: false,
                user_exists: true,
            }),
            Outcome::Fail(msg) => Err(BackendError::api(500, *msg)),
        }
    }
}

pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    pub otp_generate: Mutex<Outcome>,
    pub otp_verify: Mutex<Outcome>,
    pub auth: Mutex<Outcome>,
    pub dev_otp: Mutex<Option<String>>,
    pub profile: Mutex<Option<UserProfile>>,
    pub jobs: Mutex<Vec<JobPosting>>,
    pub cvs: Mutex<Vec<CvRecord>>,
    /// When set, `generate_otp` waits for a notification before answering.
    pub generate_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, `verify_otp` sleeps this long before answering.
    pub verify_delay: Mutex<Option<Duration>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            otp_generate: Mutex::new(Outcome::Ok),
            otp_verify: Mutex::new(Outcome::Ok),
            auth: Mutex::new(Outcome::Ok),
            dev_otp: Mutex::new(None),
            profile: Mutex::new(None),
            jobs: Mutex::new(Vec::new()),
            cvs: Mutex::new(Vec::new()),
            generate_gate: Mutex::new(None),
            verify_delay: Mutex::new(None),
        }
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_profile(profile: UserProfile) -> Arc<Self> {
        let api = Self::default();
        *api.profile.lock().unwrap() = Some(profile);
        Arc::new(api)
    }

    pub fn set<T>(slot: &Mutex<T>, value: T) {
        *slot.lock().unwrap() = value;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn auth_response(&self) -> Result<AuthResponse, BackendError> {
        self.auth.lock().unwrap().to_result()?;
        let user = self.profile.lock().unwrap().clone().unwrap_or_else(|| UserProfile {
            id: "u-1".into(),
            ..UserProfile::default()
        });
        Ok(AuthResponse {
            token: "fake-token".into(),
            user,
        })
    }

    fn document(name: &str) -> Document {
        Document {
            content_type: "application/pdf".into(),
            file_name: Some(format!("{name}.pdf")),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        }
    }
}

#[async_trait]
impl EmployerApi for FakeApi {
    async fn generate_otp(
        &self,
        _req: &OtpGenerateRequest,
    ) -> Result<OtpGenerateResponse, BackendError> {
        self.record("generate_otp");
        let gate = self.generate_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.otp_generate.lock().unwrap().to_result()?;
        Ok(OtpGenerateResponse {
            otp: self.dev_otp.lock().unwrap().clone(),
            user_not_found: false,
            message: None,
        })
    }

    async fn verify_otp(&self, _req: &OtpVerifyRequest) -> Result<(), BackendError> {
        self.record("verify_otp");
        let delay = *self.verify_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.otp_verify.lock().unwrap().to_result()
    }

    async fn register_employer(&self, _req: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        self.record("register_employer");
        self.auth_response()
    }

    async fn login_employer(&self, _req: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.record("login_employer");
        self.auth_response()
    }

    async fn login_by_phone(&self, _req: &PhoneLoginRequest) -> Result<AuthResponse, BackendError> {
        self.record("login_by_phone");
        self.auth_response()
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.record("current_user");
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::api(401, "Not authenticated"))
    }

    async fn update_current_user(&self, req: &ProfileUpdate) -> Result<UserProfile, BackendError> {
        self.record("update_current_user");
        let mut slot = self.profile.lock().unwrap();
        let profile = slot
            .as_mut()
            .ok_or_else(|| BackendError::api(401, "Not authenticated"))?;
        if let Some(plan) = &req.plan {
            profile.plan = Some(plan.clone());
        }
        Ok(profile.clone())
    }

    async fn my_jobs(&self) -> Result<Vec<JobPosting>, BackendError> {
        self.record("my_jobs");
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn create_job(&self, job: &JobPayload) -> Result<JobPosting, BackendError> {
        self.record("create_job");
        let mut jobs = self.jobs.lock().unwrap();
        let created = JobPosting {
            id: format!("job-{}", jobs.len() + 1),
            title: job.title.clone(),
            description: job.description.clone(),
            location: job.location.clone(),
            job_type: job.job_type.clone(),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            openings: job.openings,
            status: job.status,
            applications: Vec::new(),
            created_at: None,
        };
        jobs.push(created.clone());
        Ok(created)
    }

    async fn update_job(&self, id: &str, job: &JobPayload) -> Result<JobPosting, BackendError> {
        self.record("update_job");
        let mut jobs = self.jobs.lock().unwrap();
        let existing = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| BackendError::api(404, "Job not found"))?;
        existing.title = job.title.clone();
        existing.description = job.description.clone();
        existing.status = job.status;
        Ok(existing.clone())
    }

    async fn update_application_status(
        &self,
        req: &ApplicationStatusUpdate,
    ) -> Result<(), BackendError> {
        self.record("update_application_status");
        let mut jobs = self.jobs.lock().unwrap();
        let app = jobs
            .iter_mut()
            .filter(|j| j.id == req.job_id)
            .flat_map(|j| j.applications.iter_mut())
            .find(|a| a.id == req.application_id)
            .ok_or_else(|| BackendError::api(404, "Application not found"))?;
        app.status = req.status;
        Ok(())
    }

    async fn application_resume(
        &self,
        _job_id: &str,
        application_id: &str,
        _mode: DocumentMode,
    ) -> Result<Document, BackendError> {
        self.record("application_resume");
        Ok(Self::document(application_id))
    }

    async fn recruiter_cvs(&self) -> Result<Vec<CvRecord>, BackendError> {
        self.record("recruiter_cvs");
        Ok(self.cvs.lock().unwrap().clone())
    }

    async fn recruiter_cv(&self, id: &str, _mode: DocumentMode) -> Result<Document, BackendError> {
        self.record("recruiter_cv");
        Ok(Self::document(id))
    }

    async fn submit_sales_enquiry(&self, _req: &SalesEnquiry) -> Result<(), BackendError> {
        self.record("submit_sales_enquiry");
        Ok(())
    }
}
