// handlers/protected/bookmarks.rs - POST /api/jobs/:id/bookmark, GET /api/jobs/bookmarks

use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::utils::{load_job, parse_id};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Job, JobStatus};
use crate::policy::CompanyAccess;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BookmarkState {
    pub job: Uuid,
    pub bookmarked: bool,
}

/// POST /api/jobs/:id/bookmark - toggle; jobs that left `active` can only be un-bookmarked
pub async fn toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<BookmarkState> {
    let id = parse_id(&id, "Job")?;
    let job = load_job(&state, id).await?;

    if job.status != JobStatus::Active {
        let already = state
            .store
            .bookmarked_jobs(auth.user_id)
            .await?
            .iter()
            .any(|j| j.id == job.id);
        let on_team = match state.store.company_by_id(job.company).await? {
            Some(company) => CompanyAccess::resolve(&company, auth.user_id).can_view(),
            None => false,
        };
        if !already && !on_team {
            return Err(ApiError::not_found("Job not found"));
        }
    }

    let bookmarked = state.store.toggle_bookmark(auth.user_id, job.id).await?;
    Ok(ApiResponse::success(BookmarkState {
        job: job.id,
        bookmarked,
    }))
}

/// GET /api/jobs/bookmarks - the caller's saved jobs
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Job>> {
    let jobs = state.store.bookmarked_jobs(auth.user_id).await?;
    Ok(ApiResponse::success(jobs))
}
