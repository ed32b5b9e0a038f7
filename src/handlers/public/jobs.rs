// handlers/public/jobs.rs - GET /api/jobs, GET /api/jobs/:id

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::database::JobScope;
use crate::error::ApiError;
use crate::filter::{JobFilter, JobQuery, Page};
use crate::handlers::utils::{load_job, parse_id};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MaybeAuthUser};
use crate::models::{ApplicationStatus, CompanySummary, Job, JobStatus, UserRole};
use crate::policy::CompanyAccess;
use crate::state::AppState;

/// Listing row: the job plus its company's display name
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCard {
    #[serde(flatten)]
    pub job: Job,
    pub company_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub company_info: Option<CompanySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerState>,
}

/// How the job relates to the signed-in caller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub bookmarked: bool,
    pub application_id: Option<Uuid>,
    pub application_status: Option<ApplicationStatus>,
    pub can_apply: bool,
    pub can_manage: bool,
}

/// GET /api/jobs - active jobs still accepting applications
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Page<JobCard>> {
    let filter = JobFilter::from_query(&query, &state.config.listing)?.open_only(Utc::now());
    let jobs = state.store.list_jobs(JobScope::Active).await?;
    let page = filter.apply(jobs);

    let mut names: HashMap<Uuid, Option<String>> = HashMap::new();
    for job in &page.items {
        if !names.contains_key(&job.company) {
            let name = state.store.company_by_id(job.company).await?.map(|c| c.name);
            names.insert(job.company, name);
        }
    }

    Ok(ApiResponse::success(page.map(|job| JobCard {
        company_name: names.get(&job.company).cloned().flatten(),
        job,
    })))
}

/// GET /api/jobs/:id - job detail; non-active jobs only for the company's team
pub async fn get(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<String>,
) -> ApiResult<JobDetail> {
    let id = parse_id(&id, "Job")?;
    let mut job = load_job(&state, id).await?;
    let company = state.store.company_by_id(job.company).await?;

    let access = match (&viewer, &company) {
        (Some(user), Some(company)) => CompanyAccess::resolve(company, user.user_id),
        _ => CompanyAccess::None,
    };

    if job.status != JobStatus::Active && !access.can_view() {
        return Err(ApiError::not_found("Job not found"));
    }

    if !access.can_view() {
        state.store.record_job_view(job.id).await?;
        job.view_count += 1;
    }

    let viewer = match viewer {
        Some(user) => Some(viewer_state(&state, &user, &job, access).await?),
        None => None,
    };

    Ok(ApiResponse::success(JobDetail {
        company_info: company.map(|c| c.summary()),
        job,
        viewer,
    }))
}

async fn viewer_state(
    state: &AppState,
    user: &AuthUser,
    job: &Job,
    access: CompanyAccess,
) -> Result<ViewerState, ApiError> {
    let bookmarked = state
        .store
        .bookmarked_jobs(user.user_id)
        .await?
        .iter()
        .any(|j| j.id == job.id);

    let application = state
        .store
        .applications_for_applicant(user.user_id)
        .await?
        .into_iter()
        .find(|a| a.job == job.id);

    let can_apply = user.role == UserRole::Jobseeker && application.is_none() && job.is_open(Utc::now());

    Ok(ViewerState {
        bookmarked,
        application_id: application.as_ref().map(|a| a.id),
        application_status: application.map(|a| a.status),
        can_apply,
        can_manage: access.can_manage_jobs(),
    })
}
