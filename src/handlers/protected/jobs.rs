// handlers/protected/jobs.rs - job posting management for company teams

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::utils::{
    clean, gated_company, gated_job, normalize_list, parse_id, ApiJson, FieldErrors,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{ExperienceLevel, Job, JobStatus, JobType};
use crate::policy::Capability;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Required on create, ignored on update
    pub company: Option<String>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub job_type: String,
    pub experience_level: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Defaults to `active` on create; unchanged on update when absent
    pub status: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct JobStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedJob {
    pub id: Uuid,
    #[serde(rename = "removedApplications")]
    pub removed_applications: usize,
}

/// Validated editable fields of a posting
struct JobFields {
    title: String,
    description: String,
    location: Option<String>,
    job_type: JobType,
    experience_level: Option<ExperienceLevel>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    skills: Vec<String>,
    status: Option<JobStatus>,
    application_deadline: Option<DateTime<Utc>>,
}

/// `previous_deadline` lets an update keep a deadline that has since passed.
fn job_fields(body: JobRequest, previous_deadline: Option<DateTime<Utc>>) -> Result<JobFields, ApiError> {
    let mut errors = FieldErrors::new();

    let title = body.title.trim().to_string();
    errors.check(!title.is_empty(), "title", "Title is required");
    errors.check(title.chars().count() <= MAX_TITLE_LEN, "title", "Title is too long");

    let description = body.description.trim().to_string();
    errors.check(!description.is_empty(), "description", "Description is required");

    let job_type = match body.job_type.parse::<JobType>() {
        Ok(t) => Some(t),
        Err(e) => {
            errors.add("jobType", e.to_string());
            None
        }
    };

    let experience_level = match clean(body.experience_level) {
        Some(raw) => match raw.parse::<ExperienceLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                errors.add("experienceLevel", e.to_string());
                None
            }
        },
        None => None,
    };

    let status = match clean(body.status) {
        Some(raw) => match raw.parse::<JobStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                errors.add("status", e.to_string());
                None
            }
        },
        None => None,
    };

    errors.check(body.salary_min.map_or(true, |v| v >= 0), "salaryMin", "Salary cannot be negative");
    errors.check(body.salary_max.map_or(true, |v| v >= 0), "salaryMax", "Salary cannot be negative");
    if let (Some(min), Some(max)) = (body.salary_min, body.salary_max) {
        errors.check(min <= max, "salaryMax", "Maximum salary must not be below the minimum");
    }

    if let Some(deadline) = body.application_deadline {
        let unchanged = previous_deadline == Some(deadline);
        errors.check(
            unchanged || deadline > Utc::now(),
            "applicationDeadline",
            "Deadline must be in the future",
        );
    }

    errors.finish()?;
    let job_type = job_type.ok_or_else(|| ApiError::invalid_field("jobType", "Job type is required"))?;

    Ok(JobFields {
        title,
        description,
        location: clean(body.location),
        job_type,
        experience_level,
        salary_min: body.salary_min,
        salary_max: body.salary_max,
        skills: normalize_list(&body.skills),
        status,
        application_deadline: body.application_deadline,
    })
}

/// POST /api/jobs - post a job for a company the caller manages jobs for
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut body): ApiJson<JobRequest>,
) -> ApiResult<Job> {
    let company_id = match body.company.take() {
        Some(raw) => parse_id(&raw, "Company")?,
        None => return Err(ApiError::invalid_field("company", "Company is required")),
    };
    let (company, _) = gated_company(&state, company_id, &auth, Capability::ManageJobs).await?;

    let fields = job_fields(body, None)?;
    let now = Utc::now();
    let job = Job {
        id: Uuid::new_v4(),
        company: company.id,
        title: fields.title,
        description: fields.description,
        location: fields.location,
        job_type: fields.job_type,
        experience_level: fields.experience_level,
        salary_min: fields.salary_min,
        salary_max: fields.salary_max,
        skills: fields.skills,
        status: fields.status.unwrap_or(JobStatus::Active),
        application_deadline: fields.application_deadline,
        application_count: 0,
        view_count: 0,
        created_by: auth.user_id,
        created_at: now,
        updated_at: now,
    };

    let job = state.store.insert_job(job).await?;
    tracing::info!("User {} posted job {} for company {}", auth.user_id, job.id, company.id);
    Ok(ApiResponse::created(job))
}

/// PUT /api/jobs/:id - replace the editable fields; counters are kept
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<JobRequest>,
) -> ApiResult<Job> {
    let id = parse_id(&id, "Job")?;
    let (mut job, _) = gated_job(&state, id, &auth, Capability::ManageJobs).await?;

    let fields = job_fields(body, job.application_deadline)?;
    job.title = fields.title;
    job.description = fields.description;
    job.location = fields.location;
    job.job_type = fields.job_type;
    job.experience_level = fields.experience_level;
    job.salary_min = fields.salary_min;
    job.salary_max = fields.salary_max;
    job.skills = fields.skills;
    if let Some(status) = fields.status {
        job.status = status;
    }
    job.application_deadline = fields.application_deadline;
    job.updated_at = Utc::now();

    let job = state.store.update_job(job).await?;
    Ok(ApiResponse::success(job))
}

/// PATCH /api/jobs/:id/status - publish, pause or close a posting
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<JobStatusRequest>,
) -> ApiResult<Job> {
    let id = parse_id(&id, "Job")?;
    let status = body
        .status
        .parse::<JobStatus>()
        .map_err(|e| ApiError::invalid_field("status", e.to_string()))?;
    let (mut job, _) = gated_job(&state, id, &auth, Capability::ManageJobs).await?;

    if job.status != status {
        tracing::info!("Job {} status {} -> {}", job.id, job.status, status);
        job.status = status;
        job.updated_at = Utc::now();
        job = state.store.update_job(job).await?;
    }
    Ok(ApiResponse::success(job))
}

/// DELETE /api/jobs/:id - removes the job with its applications, bookmarks and resumes
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<DeletedJob> {
    let id = parse_id(&id, "Job")?;
    let (job, _) = gated_job(&state, id, &auth, Capability::ManageJobs).await?;

    let removed = state.store.delete_job(job.id).await?;
    for application in &removed {
        if let Some(resume) = &application.resume {
            if let Err(e) = state.resumes.remove(&resume.stored_as).await {
                tracing::warn!("Could not remove resume {}: {}", resume.stored_as, e);
            }
        }
    }

    tracing::info!("User {} deleted job {} ({} applications)", auth.user_id, job.id, removed.len());
    Ok(ApiResponse::success(DeletedJob {
        id: job.id,
        removed_applications: removed.len(),
    }))
}
