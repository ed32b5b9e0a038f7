// handlers/protected/profile.rs - GET/PUT /api/profile (job seekers)

use axum::extract::State;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::utils::{clean, normalize_links, normalize_list, ApiJson, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Education, Experience, JobSeekerProfile, UserRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceInput {
    pub title: String,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationInput {
    pub school: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceInput>,
    #[serde(default)]
    pub education: Vec<EducationInput>,
    #[serde(default)]
    pub portfolio_links: Vec<String>,
}

fn require_jobseeker(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role == UserRole::Jobseeker {
        Ok(())
    } else {
        Err(ApiError::forbidden("Profiles are only available to job seekers"))
    }
}

/// GET /api/profile - stored profile, or an empty one before the first save
pub async fn get(State(state): State<AppState>, auth: AuthUser) -> ApiResult<JobSeekerProfile> {
    require_jobseeker(&auth)?;
    let profile = state
        .store
        .profile_for(auth.user_id)
        .await?
        .unwrap_or_else(|| JobSeekerProfile::empty(auth.user_id));
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile - replace the whole profile
pub async fn put(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ProfileRequest>,
) -> ApiResult<JobSeekerProfile> {
    require_jobseeker(&auth)?;
    let mut errors = FieldErrors::new();

    let mut experience = Vec::with_capacity(body.experience.len());
    for (i, entry) in body.experience.into_iter().enumerate() {
        let field = format!("experience[{}]", i);
        if entry.title.trim().is_empty() || entry.company.trim().is_empty() {
            errors.add(&field, "Title and company are required");
            continue;
        }
        if entry.end_date.is_some_and(|end| end < entry.start_date) {
            errors.add(&field, "End date is before start date");
            continue;
        }
        experience.push(Experience {
            title: entry.title.trim().to_string(),
            company: entry.company.trim().to_string(),
            start_date: entry.start_date,
            end_date: entry.end_date,
            description: clean(entry.description),
        });
    }

    let latest_year = Utc::now().year() + 10;
    let mut education = Vec::with_capacity(body.education.len());
    for (i, entry) in body.education.into_iter().enumerate() {
        let field = format!("education[{}]", i);
        if entry.school.trim().is_empty() {
            errors.add(&field, "School is required");
            continue;
        }
        if entry.graduation_year.is_some_and(|y| !(1900..=latest_year).contains(&y)) {
            errors.add(&field, "Graduation year is out of range");
            continue;
        }
        education.push(Education {
            school: entry.school.trim().to_string(),
            degree: clean(entry.degree),
            field: clean(entry.field),
            graduation_year: entry.graduation_year,
        });
    }

    let portfolio_links = match normalize_links(&body.portfolio_links) {
        Ok(links) => links,
        Err(problem) => {
            errors.add("portfolioLinks", problem);
            Vec::new()
        }
    };
    errors.finish()?;

    let profile = JobSeekerProfile {
        user: auth.user_id,
        headline: clean(body.headline),
        summary: clean(body.summary),
        location: clean(body.location),
        skills: normalize_list(&body.skills),
        experience,
        education,
        portfolio_links,
        updated_at: Utc::now(),
    };

    let profile = state.store.upsert_profile(profile).await?;
    Ok(ApiResponse::success(profile))
}
