// handlers/protected/applications.rs - application submission, review and lifecycle
//
// The applicant sees their own application without internal notes. The
// company team sees everything; changing status, adding notes or downloading the
// resume needs the job-management capability. Anyone else gets 404.

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::StoreError;
use crate::error::ApiError;
use crate::filter::{ApplicationFilter, ApplicationQuery, Page};
use crate::handlers::utils::{
    clean, gated_job, load_application, load_job, normalize_links, parse_id, ApiJson,
    MAX_COVER_LETTER_LEN,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Actor, Application, ApplicationStatus, JobSeekerProfile, UserRole};
use crate::policy::{Capability, CompanyAccess};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicantInfo {
    pub name: String,
    pub email: String,
}

/// Row in the applicant's own list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyApplication {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
}

/// Row in a job's applicant list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRow {
    #[serde(flatten)]
    pub application: Application,
    pub applicant_info: Option<ApplicantInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: Option<String>,
    /// Team view only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_info: Option<ApplicantInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_profile: Option<JobSeekerProfile>,
}

/// The caller's relationship to one application
enum Viewer {
    Applicant,
    Team(CompanyAccess),
}

async fn viewer_of(state: &AppState, application: &Application, auth: &AuthUser) -> Result<Viewer, ApiError> {
    if application.applicant == auth.user_id {
        return Ok(Viewer::Applicant);
    }
    let access = match state.store.company_by_id(application.company).await? {
        Some(company) => CompanyAccess::resolve(&company, auth.user_id),
        None => CompanyAccess::None,
    };
    if access.can_view() {
        Ok(Viewer::Team(access))
    } else {
        Err(ApiError::not_found("Application not found"))
    }
}

/// Application the caller may manage; the applicant and read-only members get 403.
async fn managed_application(state: &AppState, id: &str, auth: &AuthUser) -> Result<Application, ApiError> {
    let id = parse_id(id, "Application")?;
    let application = load_application(state, id).await?;
    match viewer_of(state, &application, auth).await? {
        Viewer::Team(access) if access.can_manage_jobs() => Ok(application),
        Viewer::Team(_) => Err(ApiError::forbidden("Your team role cannot manage applications")),
        Viewer::Applicant => Err(ApiError::forbidden("Only the hiring team can do this")),
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the request size limit")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// `portfolioLinks` may repeat, hold a JSON array, or a comma/newline list.
fn split_links(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(links) = serde_json::from_str::<Vec<String>>(trimmed) {
            return links;
        }
    }
    trimmed
        .split(|c| c == ',' || c == '\n')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

struct UploadedResume {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// POST /api/applications - multipart: job, coverLetter, portfolioLinks, resume
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Application> {
    if auth.role != UserRole::Jobseeker {
        return Err(ApiError::forbidden("Only job seekers can apply to jobs"));
    }
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut job_raw: Option<String> = None;
    let mut cover_letter: Option<String> = None;
    let mut links: Vec<String> = Vec::new();
    let mut resume: Option<UploadedResume> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job" | "jobId" => job_raw = Some(field.text().await.map_err(multipart_error)?),
            "coverLetter" => cover_letter = clean(Some(field.text().await.map_err(multipart_error)?)),
            "portfolioLinks" | "portfolioLinks[]" => {
                links.extend(split_links(&field.text().await.map_err(multipart_error)?))
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                resume = Some(UploadedResume {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let job_raw = job_raw.ok_or_else(|| ApiError::invalid_field("job", "Job is required"))?;
    let job = load_job(&state, parse_id(&job_raw, "Job")?).await?;
    if !job.is_open(Utc::now()) {
        return Err(ApiError::bad_request("This job is no longer accepting applications"));
    }

    if cover_letter.as_ref().is_some_and(|c| c.chars().count() > MAX_COVER_LETTER_LEN) {
        return Err(ApiError::invalid_field(
            "coverLetter",
            format!("Cover letter must be at most {} characters", MAX_COVER_LETTER_LEN),
        ));
    }
    let links = normalize_links(&links).map_err(|p| ApiError::invalid_field("portfolioLinks", p))?;
    let upload = resume.ok_or_else(|| ApiError::invalid_field("resume", "A resume file is required"))?;

    let already = state
        .store
        .applications_for_applicant(auth.user_id)
        .await?
        .iter()
        .any(|a| a.job == job.id);
    if already {
        return Err(ApiError::conflict("You have already applied to this job"));
    }

    let stored = state
        .resumes
        .save(&upload.file_name, upload.content_type.as_deref(), &upload.bytes)
        .await?;
    let stored_as = stored.stored_as.clone();

    let application = Application::submit(&job, auth.user_id, cover_letter, Some(stored), links);
    let application = match state.store.insert_application(application).await {
        Ok(application) => application,
        Err(e) => {
            if let Err(cleanup) = state.resumes.remove(&stored_as).await {
                tracing::warn!("Could not remove orphaned resume {}: {}", stored_as, cleanup);
            }
            return Err(match e {
                StoreError::Conflict(_) => ApiError::conflict("You have already applied to this job"),
                other => other.into(),
            });
        }
    };

    tracing::info!("User {} applied to job {} ({})", auth.user_id, job.id, application.id);
    Ok(ApiResponse::created(application))
}

/// GET /api/applications/mine
pub async fn mine(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<MyApplication>> {
    let mut applications = state.store.applications_for_applicant(auth.user_id).await?;
    applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut company_names: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut rows = Vec::with_capacity(applications.len());
    for application in applications {
        let job_title = state.store.job_by_id(application.job).await?.map(|j| j.title);
        if !company_names.contains_key(&application.company) {
            let name = state.store.company_by_id(application.company).await?.map(|c| c.name);
            company_names.insert(application.company, name);
        }
        rows.push(MyApplication {
            company_name: company_names.get(&application.company).cloned().flatten(),
            job_title,
            application: application.for_applicant(),
        });
    }
    Ok(ApiResponse::success(rows))
}

/// GET /api/applications/:id
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApplicationDetail> {
    let id = parse_id(&id, "Application")?;
    let application = load_application(&state, id).await?;
    let job_title = state.store.job_by_id(application.job).await?.map(|j| j.title);

    let detail = match viewer_of(&state, &application, &auth).await? {
        Viewer::Applicant => ApplicationDetail {
            application: application.for_applicant(),
            job_title,
            applicant_info: None,
            applicant_profile: None,
        },
        Viewer::Team(_) => {
            let applicant_info = state
                .store
                .user_by_id(application.applicant)
                .await?
                .map(|u| ApplicantInfo { name: u.name, email: u.email });
            let applicant_profile = state.store.profile_for(application.applicant).await?;
            ApplicationDetail {
                application,
                job_title,
                applicant_info,
                applicant_profile,
            }
        }
    };
    Ok(ApiResponse::success(detail))
}

/// GET /api/jobs/:id/applications - ?status=&sort=newest|oldest&page=&limit=
pub async fn for_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Page<ApplicantRow>> {
    let id = parse_id(&id, "Job")?;
    let (job, _) = gated_job(&state, id, &auth, Capability::ManageJobs).await?;

    let filter = ApplicationFilter::from_query(&query, &state.config.listing)?;
    let page = filter.apply(state.store.applications_for_job(job.id).await?);

    let mut rows = Vec::with_capacity(page.items.len());
    for application in page.items {
        let applicant_info = state
            .store
            .user_by_id(application.applicant)
            .await?
            .map(|u| ApplicantInfo { name: u.name, email: u.email });
        rows.push(ApplicantRow {
            application,
            applicant_info,
        });
    }

    Ok(ApiResponse::success(Page {
        items: rows,
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// PATCH /api/applications/:id/status - hiring team moves the application along
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusChangeRequest>,
) -> ApiResult<Application> {
    let to = body
        .status
        .parse::<ApplicationStatus>()
        .map_err(|e| ApiError::invalid_field("status", e.to_string()))?;
    let mut application = managed_application(&state, &id, &auth).await?;

    let (from, seen) = (application.status, application.updated_at);
    application.transition(to, Actor::Manager, auth.user_id, clean(body.note))?;
    let application = state.store.update_application(application, seen).await?;

    tracing::info!("Application {} {} -> {} by {}", application.id, from, to, auth.user_id);
    Ok(ApiResponse::success(application))
}

/// POST /api/applications/:id/withdraw - applicant only
pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Application> {
    let id = parse_id(&id, "Application")?;
    let mut application = load_application(&state, id).await?;

    if let Viewer::Team(_) = viewer_of(&state, &application, &auth).await? {
        return Err(ApiError::forbidden("Only the applicant can withdraw an application"));
    }

    let seen = application.updated_at;
    application.transition(ApplicationStatus::Withdrawn, Actor::Applicant, auth.user_id, None)?;
    let application = state.store.update_application(application, seen).await?;

    tracing::info!("Application {} withdrawn", application.id);
    Ok(ApiResponse::success(application.for_applicant()))
}

/// POST /api/applications/:id/notes - internal note, never shown to the applicant
pub async fn add_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NoteRequest>,
) -> ApiResult<Application> {
    let text = body.body.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::invalid_field("body", "Note cannot be empty"));
    }
    let mut application = managed_application(&state, &id, &auth).await?;

    let seen = application.updated_at;
    application.add_note(auth.user_id, text);
    let application = state.store.update_application(application, seen).await?;
    Ok(ApiResponse::created(application))
}

/// GET /api/applications/:id/resume - raw file for the applicant or a hiring manager
pub async fn resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Application")?;
    let application = load_application(&state, id).await?;
    match viewer_of(&state, &application, &auth).await? {
        Viewer::Applicant => {}
        Viewer::Team(access) if access.can_manage_jobs() => {}
        Viewer::Team(_) => return Err(ApiError::forbidden("Your team role cannot download resumes")),
    }

    let file = application
        .resume
        .ok_or_else(|| ApiError::not_found("This application has no resume"))?;
    let bytes = state.resumes.load(&file.stored_as).await?;

    let safe_name: String = file
        .file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_name),
            ),
        ],
        bytes,
    ))
}
