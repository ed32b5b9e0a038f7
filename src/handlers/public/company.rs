// handlers/public/company.rs - GET /api/company/:id

use axum::extract::{Path, State};

use crate::handlers::utils::{load_company, parse_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::CompanySummary;
use crate::state::AppState;

/// GET /api/company/:id - public company profile without owner or team
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CompanySummary> {
    let id = parse_id(&id, "Company")?;
    let company = load_company(&state, id).await?;
    Ok(ApiResponse::success(company.summary()))
}
