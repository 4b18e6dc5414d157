use serde::Deserialize;

use super::{matches_search, paginate, Page};
use crate::api_client::{Application, ApplicationStatus, CvRecord, JobPosting};
use crate::errors::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantFilter {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "per_page")]
    pub per_page: Option<usize>,
}

/// Applicants of one of the employer's jobs, newest first.
pub fn list_applicants(
    jobs: Vec<JobPosting>,
    job_id: &str,
    filter: &ApplicantFilter,
) -> Result<Page<Application>, AppError> {
    let job = jobs
        .into_iter()
        .find(|j| j.id == job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut applicants: Vec<Application> = job
        .applications
        .into_iter()
        .filter(|a| filter.status.map_or(true, |s| a.status == s))
        .collect();
    applicants.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

    Ok(paginate(applicants, filter.page, filter.per_page))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvFilter {
    /// Matched against the candidate name and skills.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_experience: Option<f32>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "per_page")]
    pub per_page: Option<usize>,
}

impl CvFilter {
    pub fn matches(&self, cv: &CvRecord) -> bool {
        if let Some(needle) = self.search.as_deref() {
            let mut fields: Vec<&str> = vec![cv.name.as_str()];
            fields.extend(cv.skills.iter().map(String::as_str));
            if !matches_search(needle, &fields) {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref() {
            if !matches_search(location, &[cv.location.as_deref().unwrap_or_default()]) {
                return false;
            }
        }
        match self.min_experience {
            Some(min) => cv.experience_years.is_some_and(|years| years >= min),
            None => true,
        }
    }

    pub fn apply(&self, cvs: Vec<CvRecord>) -> Page<CvRecord> {
        let hits = cvs.into_iter().filter(|cv| self.matches(cv)).collect();
        paginate(hits, self.page, self.per_page)
    }
}
