// handlers/protected/company.rs - company profile, team list and company job listing
//
// Every route except create and mine resolves the caller through the company
// gate; callers outside the gate get 404.

use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::JobScope;
use crate::error::ApiError;
use crate::filter::{JobFilter, JobQuery, Page};
use crate::handlers::utils::{
    clean, gated_company, load_user, normalize_link, normalize_list, parse_id, ApiJson, FieldErrors,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{user::normalize_email, Company, Job, TeamMember, TeamRole, UserRole};
use crate::policy::Capability;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamMemberRequest {
    pub email: String,
    /// Defaults to `member`
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TeamMemberUpdate {
    pub role: String,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    pub user: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    /// `owner` for the company owner, otherwise the team role
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamView {
    pub company: Uuid,
    pub members: Vec<TeamEntry>,
}

/// Parsed and normalized company profile fields
struct CompanyFields {
    name: String,
    description: Option<String>,
    website: Option<String>,
    location: Option<String>,
    industry: Option<String>,
    size: Option<String>,
}

fn company_fields(body: CompanyRequest) -> Result<CompanyFields, ApiError> {
    let mut errors = FieldErrors::new();
    let name = body.name.trim().to_string();
    errors.check(!name.is_empty(), "name", "Company name is required");
    errors.check(name.chars().count() <= 200, "name", "Company name is too long");

    let website = match clean(body.website) {
        Some(raw) => match normalize_link(&raw) {
            Ok(link) => Some(link),
            Err(problem) => {
                errors.add("website", problem);
                None
            }
        },
        None => None,
    };
    errors.finish()?;

    Ok(CompanyFields {
        name,
        description: clean(body.description),
        website,
        location: clean(body.location),
        industry: clean(body.industry),
        size: clean(body.size),
    })
}

fn parse_team_role(raw: &str) -> Result<TeamRole, ApiError> {
    raw.parse::<TeamRole>().map_err(|_| {
        let allowed: Vec<&str> = TeamRole::ALL.iter().map(|r| r.as_str()).collect();
        ApiError::invalid_field("role", format!("Role must be one of: {}", allowed.join(", ")))
    })
}

/// POST /api/company - employers create a company they own
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CompanyRequest>,
) -> ApiResult<Company> {
    let user = load_user(&state, &auth).await?;
    if user.role != UserRole::Employer {
        return Err(ApiError::forbidden("Only employer accounts can create companies"));
    }

    let fields = company_fields(body)?;
    let now = Utc::now();
    let company = Company {
        id: Uuid::new_v4(),
        name: fields.name,
        description: fields.description,
        website: fields.website,
        location: fields.location,
        industry: fields.industry,
        size: fields.size,
        owner: user.id,
        team_members: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let company = state.store.insert_company(company).await?;
    tracing::info!("User {} created company {}", user.id, company.id);
    Ok(ApiResponse::created(company))
}

/// GET /api/company/mine - companies the caller owns or is on the team of
pub async fn mine(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Company>> {
    let companies = state.store.companies_for_user(auth.user_id).await?;
    Ok(ApiResponse::success(companies))
}

/// PUT /api/company/:id - replace the profile fields
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CompanyRequest>,
) -> ApiResult<Company> {
    let id = parse_id(&id, "Company")?;
    let (mut company, _) = gated_company(&state, id, &auth, Capability::ManageTeam).await?;

    let fields = company_fields(body)?;
    company.name = fields.name;
    company.description = fields.description;
    company.website = fields.website;
    company.location = fields.location;
    company.industry = fields.industry;
    company.size = fields.size;
    let seen = std::mem::replace(&mut company.updated_at, Utc::now());

    let company = state.store.update_company(company, seen).await?;
    Ok(ApiResponse::success(company))
}

/// GET /api/company/:id/team
pub async fn team_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<TeamView> {
    let id = parse_id(&id, "Company")?;
    let (company, _) = gated_company(&state, id, &auth, Capability::View).await?;
    Ok(ApiResponse::success(team_view(&state, &company).await?))
}

/// POST /api/company/:id/team - add an existing account to the team
pub async fn team_add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TeamMemberRequest>,
) -> ApiResult<TeamView> {
    let id = parse_id(&id, "Company")?;
    let (mut company, _) = gated_company(&state, id, &auth, Capability::ManageTeam).await?;

    let role = match body.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => parse_team_role(raw)?,
        None => TeamRole::Member,
    };

    let email = normalize_email(&body.email);
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("No account uses that e-mail"))?;

    if user.id == company.owner {
        return Err(ApiError::conflict("That user already owns the company"));
    }
    if company.member(user.id).is_some() {
        return Err(ApiError::conflict("That user is already on the team"));
    }

    company.team_members.push(TeamMember {
        user: user.id,
        role,
        permissions: normalize_list(&body.permissions.unwrap_or_default()),
        added_at: Utc::now(),
    });
    let seen = std::mem::replace(&mut company.updated_at, Utc::now());

    let company = state.store.update_company(company, seen).await?;
    tracing::info!("Added {} to company {} as {}", user.id, company.id, role);
    Ok(ApiResponse::created(team_view(&state, &company).await?))
}

/// PATCH /api/company/:id/team/:userId - change a member's role or permissions
pub async fn team_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<TeamMemberUpdate>,
) -> ApiResult<TeamView> {
    let id = parse_id(&id, "Company")?;
    let user_id = parse_id(&user_id, "Team member")?;
    let (mut company, _) = gated_company(&state, id, &auth, Capability::ManageTeam).await?;
    let role = parse_team_role(&body.role)?;

    let member = company
        .team_members
        .iter_mut()
        .find(|m| m.user == user_id)
        .ok_or_else(|| ApiError::not_found("Team member not found"))?;
    member.role = role;
    if let Some(permissions) = body.permissions {
        member.permissions = normalize_list(&permissions);
    }
    let seen = std::mem::replace(&mut company.updated_at, Utc::now());

    let company = state.store.update_company(company, seen).await?;
    Ok(ApiResponse::success(team_view(&state, &company).await?))
}

/// DELETE /api/company/:id/team/:userId
pub async fn team_remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<TeamView> {
    let id = parse_id(&id, "Company")?;
    let user_id = parse_id(&user_id, "Team member")?;
    let (mut company, _) = gated_company(&state, id, &auth, Capability::ManageTeam).await?;

    if user_id == company.owner {
        return Err(ApiError::bad_request("The company owner cannot be removed"));
    }
    let before = company.team_members.len();
    company.team_members.retain(|m| m.user != user_id);
    if company.team_members.len() == before {
        return Err(ApiError::not_found("Team member not found"));
    }
    let seen = std::mem::replace(&mut company.updated_at, Utc::now());

    let company = state.store.update_company(company, seen).await?;
    tracing::info!("Removed {} from company {}", user_id, company.id);
    Ok(ApiResponse::success(team_view(&state, &company).await?))
}

/// GET /api/company/:id/jobs - every job of the company, any status
pub async fn jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Page<Job>> {
    let id = parse_id(&id, "Company")?;
    let (company, _) = gated_company(&state, id, &auth, Capability::View).await?;

    let filter = JobFilter::from_query(&query, &state.config.listing)?;
    let jobs = state.store.list_jobs(JobScope::Company(company.id)).await?;
    Ok(ApiResponse::success(filter.apply(jobs)))
}

async fn team_view(state: &AppState, company: &Company) -> Result<TeamView, ApiError> {
    let mut members = Vec::with_capacity(company.team_members.len() + 1);

    let owner = state.store.user_by_id(company.owner).await?;
    members.push(TeamEntry {
        user: company.owner,
        name: owner.as_ref().map(|u| u.name.clone()),
        email: owner.map(|u| u.email),
        role: "owner".to_string(),
        permissions: Vec::new(),
    });

    for member in &company.team_members {
        let user = state.store.user_by_id(member.user).await?;
        members.push(TeamEntry {
            user: member.user,
            name: user.as_ref().map(|u| u.name.clone()),
            email: user.map(|u| u.email),
            role: member.role.to_string(),
            permissions: member.permissions.clone(),
        });
    }

    Ok(TeamView {
        company: company.id,
        members,
    })
}
