use serde::Deserialize;

use super::matches_search;
use crate::api_client::{JobPayload, JobPosting, JobStatus, UserProfile};
use crate::catalog::{find_plan, FREE_PLAN};
use crate::errors::AppError;
use crate::validation::FormErrors;

pub const MIN_DESCRIPTION_LENGTH: usize = 30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(default)]
    pub status: Option<JobStatus>,
    /// Matched against title and location.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "per_page")]
    pub per_page: Option<usize>,
}

impl JobFilter {
    pub fn matches(&self, job: &JobPosting) -> bool {
        if self.status.is_some_and(|s| s != job.status) {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) => matches_search(
                needle,
                &[job.title.as_str(), job.location.as_deref().unwrap_or_default()],
            ),
            None => true,
        }
    }

    pub fn apply(&self, jobs: Vec<JobPosting>) -> Vec<JobPosting> {
        jobs.into_iter().filter(|j| self.matches(j)).collect()
    }
}

fn default_openings() -> u32 {
    1
}

fn default_status() -> JobStatus {
    JobStatus::Active
}

/// The post/edit job form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub salary_min: Option<u64>,
    #[serde(default)]
    pub salary_max: Option<u64>,
    #[serde(default = "default_openings")]
    pub openings: u32,
    #[serde(default = "default_status")]
    pub status: JobStatus,
}

impl JobForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FormErrors::new();
        errors.require(&self.title, "title", "Job title");
        errors.require(&self.description, "description", "Job description");
        errors.check(
            self.description.trim().chars().count() >= MIN_DESCRIPTION_LENGTH,
            "description",
            "Job description must be at least 30 characters",
        );
        errors.check(self.openings >= 1, "openings", "At least one opening is required");
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            errors.check(
                min <= max,
                "salaryMax",
                "Maximum salary must not be below the minimum",
            );
        }
        errors.into_result()
    }

    pub fn into_payload(self) -> JobPayload {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        JobPayload {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: trimmed(self.location),
            job_type: trimmed(self.job_type),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            openings: self.openings,
            status: self.status,
        }
    }
}

/// Refuses a new posting once the plan's active-job allowance is used up.
/// Profiles without a known plan are treated as Free.
pub fn check_job_limit(profile: &UserProfile, jobs: &[JobPosting]) -> Result<(), AppError> {
    let plan = profile
        .plan
        .as_deref()
        .and_then(find_plan)
        .or_else(|| find_plan(FREE_PLAN));
    let Some(plan) = plan else {
        return Ok(());
    };
    let Some(max_jobs) = plan.limits.max_jobs else {
        return Ok(());
    };

    let active = jobs.iter().filter(|j| j.status == JobStatus::Active).count();
    if active >= max_jobs as usize {
        return Err(AppError::PlanLimit(format!(
            "Your {} plan allows {} active job posting(s). Upgrade your plan to post more.",
            plan.name, max_jobs
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn job(id: &str, title: &str, location: Option<&str>, status: JobStatus) -> JobPosting {
    JobPosting {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        location: location.map(str::to_string),
        job_type: None,
        salary_min: None,
        salary_max: None,
        openings: 1,
        status,
        applications: Vec::new(),
        created_at: None,
    }
}
