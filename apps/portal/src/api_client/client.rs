use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::types::{ApiErrorBody, Envelope};
use super::*;
use crate::session::SessionStore;

/// reqwest-backed `EmployerApi`.
///
/// The bearer token is read from the session on every request, so a login
/// or logout takes effect on the next call without rebuilding the client.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionStore,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method.clone(), self.url(path));
        debug!("Backend call: {method} {path}");
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, BackendError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        check_status(builder.send().await?).await
    }

    async fn json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, BackendError> {
        let response = self.send(method, path, body).await?;
        let text = response.text().await?;
        let parsed: Envelope<T> = serde_json::from_str(&text)?;
        Ok(parsed.into_inner())
    }

    async fn unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), BackendError> {
        self.send(method, path, body).await.map(|_| ())
    }

    async fn document(&self, path: &str) -> Result<Document, BackendError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_file_name);
        let bytes = response.bytes().await?;
        Ok(Document {
            content_type,
            file_name,
            bytes,
        })
    }
}

/// Passes 2xx responses through; turns anything else into `BackendError::Api`.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

fn api_error(status: u16, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_string());
    BackendError::Api {
        status,
        message,
        user_not_found: parsed.user_not_found,
        user_exists: parsed.user_exists,
    }
}

/// Extracts `filename="..."` from a Content-Disposition header.
fn parse_file_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl EmployerApi for BackendClient {
    async fn generate_otp(
        &self,
        req: &OtpGenerateRequest,
    ) -> Result<OtpGenerateResponse, BackendError> {
        self.json(Method::POST, "/api/otp/generate", Some(req)).await
    }

    async fn verify_otp(&self, req: &OtpVerifyRequest) -> Result<(), BackendError> {
        self.unit(Method::POST, "/api/otp/verify", Some(req)).await
    }

    async fn register_employer(&self, req: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        self.json(Method::POST, "/api/auth/employer/register", Some(req))
            .await
    }

    async fn login_employer(&self, req: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.json(Method::POST, "/api/auth/employer/login", Some(req))
            .await
    }

    async fn login_by_phone(&self, req: &PhoneLoginRequest) -> Result<AuthResponse, BackendError> {
        self.json(Method::POST, "/api/auth/login-by-phone", Some(req))
            .await
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.json::<(), _>(Method::GET, "/api/user/me", None).await
    }

    async fn update_current_user(&self, req: &ProfileUpdate) -> Result<UserProfile, BackendError> {
        self.json(Method::PUT, "/api/user/me", Some(req)).await
    }

    async fn my_jobs(&self) -> Result<Vec<JobPosting>, BackendError> {
        self.json::<(), _>(Method::GET, "/api/jobs/my/jobs", None)
            .await
    }

    async fn create_job(&self, job: &JobPayload) -> Result<JobPosting, BackendError> {
        self.json(Method::POST, "/api/jobs", Some(job)).await
    }

    async fn update_job(&self, id: &str, job: &JobPayload) -> Result<JobPosting, BackendError> {
        self.json(Method::PUT, &format!("/api/jobs/{id}"), Some(job))
            .await
    }

    async fn update_application_status(
        &self,
        req: &ApplicationStatusUpdate,
    ) -> Result<(), BackendError> {
        self.unit(Method::PUT, "/api/jobs/applications/status", Some(req))
            .await
    }

    async fn application_resume(
        &self,
        job_id: &str,
        application_id: &str,
        mode: DocumentMode,
    ) -> Result<Document, BackendError> {
        let action = mode.path_segment("-resume");
        self.document(&format!(
            "/api/jobs/applications/{job_id}/{application_id}/{action}"
        ))
        .await
    }

    async fn recruiter_cvs(&self) -> Result<Vec<CvRecord>, BackendError> {
        self.json::<(), _>(Method::GET, "/api/cv/recruiter/cvs", None)
            .await
    }

    async fn recruiter_cv(&self, id: &str, mode: DocumentMode) -> Result<Document, BackendError> {
        let action = mode.path_segment("");
        self.document(&format!("/api/cv/recruiter/cvs/{id}/{action}"))
            .await
    }

    async fn submit_sales_enquiry(&self, req: &SalesEnquiry) -> Result<(), BackendError> {
        self.unit(Method::POST, "/api/user/recruiter/apply-public", Some(req))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_message_field() {
        let err = api_error(400, r#"{"message":"Invalid OTP","error":"bad"}"#);
        assert!(matches!(err, BackendError::Api { ref message, .. } if message == "Invalid OTP"));
    }

    #[test]
    fn test_api_error_reads_flags() {
        let err = api_error(404, r#"{"message":"No user","userNotFound":true}"#);
        assert!(matches!(
            err,
            BackendError::Api {
                status: 404,
                user_not_found: true,
                user_exists: false,
                ..
            }
        ));
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = api_error(502, "  Bad Gateway \n");
        assert!(matches!(err, BackendError::Api { ref message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name(r#"attachment; filename="asha-resume.pdf""#).as_deref(),
            Some("asha-resume.pdf")
        );
        assert_eq!(parse_file_name("inline"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        use crate::storage::MemoryStore;
        use crate::sync::SyncChannel;
        use std::sync::Arc;

        let session = SessionStore::new(Arc::new(MemoryStore::new()), SyncChannel::new());
        let client =
            BackendClient::new("http://localhost:5000/", Duration::from_secs(5), session).unwrap();
        assert_eq!(client.url("/api/user/me"), "http://localhost:5000/api/user/me");
    }
}
