use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::candidates::{list_applicants, ApplicantFilter, CvFilter};
use super::enquiry::EnquiryForm;
use super::jobs::{check_job_limit, JobFilter, JobForm};
use super::{paginate, Page};
use crate::api_client::{
    Application, ApplicationStatusUpdate, CvRecord, Document, DocumentMode, JobPosting,
};
use crate::auth::resolve_current_user;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    #[serde(default)]
    pub mode: Option<DocumentMode>,
}

fn require_session(state: &AppState) -> Result<(), AppError> {
    if state.session.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Passes resume/CV bytes through with the backend's content type.
fn document_response(doc: Document, mode: DocumentMode) -> Response {
    let disposition = match mode {
        DocumentMode::View => "inline",
        DocumentMode::Download => "attachment",
    };
    let disposition = match &doc.file_name {
        Some(name) => format!("{disposition}; filename=\"{}\"", name.replace('"', "")),
        None => disposition.to_string(),
    };
    (
        [
            (header::CONTENT_TYPE, doc.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.bytes,
    )
        .into_response()
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Page<JobPosting>>, AppError> {
    require_session(&state)?;
    let jobs = filter.apply(state.api.my_jobs().await?);
    Ok(Json(paginate(jobs, filter.page, filter.per_page)))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(form): Json<JobForm>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    form.validate()?;
    let profile = resolve_current_user(&state.session, state.api.as_ref()).await?;
    let existing = state.api.my_jobs().await?;
    check_job_limit(&profile, &existing)?;

    let job = state.api.create_job(&form.into_payload()).await?;
    info!("Job posted: {}", job.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<JobForm>,
) -> Result<Json<JobPosting>, AppError> {
    require_session(&state)?;
    form.validate()?;
    let job = state.api.update_job(&id, &form.into_payload()).await?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/:job_id/applications
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(filter): Query<ApplicantFilter>,
) -> Result<Json<Page<Application>>, AppError> {
    require_session(&state)?;
    let jobs = state.api.my_jobs().await?;
    Ok(Json(list_applicants(jobs, &job_id, &filter)?))
}

/// PUT /api/v1/applications/status
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    Json(req): Json<ApplicationStatusUpdate>,
) -> Result<StatusCode, AppError> {
    require_session(&state)?;
    state.api.update_application_status(&req).await?;
    info!(
        "Application {} moved to {:?}",
        req.application_id, req.status
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/:job_id/applications/:app_id/resume?mode=view|download
pub async fn handle_application_resume(
    State(state): State<AppState>,
    Path((job_id, app_id)): Path<(String, String)>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, AppError> {
    require_session(&state)?;
    let mode = query.mode.unwrap_or(DocumentMode::View);
    let doc = state.api.application_resume(&job_id, &app_id, mode).await?;
    Ok(document_response(doc, mode))
}

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    Query(filter): Query<CvFilter>,
) -> Result<Json<Page<CvRecord>>, AppError> {
    require_session(&state)?;
    let cvs = state.api.recruiter_cvs().await?;
    Ok(Json(filter.apply(cvs)))
}

/// GET /api/v1/cvs/:id/view
pub async fn handle_view_cv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    cv_document(&state, &id, DocumentMode::View).await
}

/// GET /api/v1/cvs/:id/download
pub async fn handle_download_cv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    cv_document(&state, &id, DocumentMode::Download).await
}

async fn cv_document(state: &AppState, id: &str, mode: DocumentMode) -> Result<Response, AppError> {
    require_session(state)?;
    let doc = state.api.recruiter_cv(id, mode).await?;
    Ok(document_response(doc, mode))
}

/// POST /api/v1/enquiries
pub async fn handle_submit_enquiry(
    State(state): State<AppState>,
    Json(form): Json<EnquiryForm>,
) -> Result<StatusCode, AppError> {
    form.validate()?;
    state.api.submit_sales_enquiry(&form.into_enquiry()).await?;
    info!("Sales enquiry submitted");
    Ok(StatusCode::ACCEPTED)
}
