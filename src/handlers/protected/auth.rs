// handlers/protected/auth.rs - GET /api/auth/me

use axum::extract::State;
use serde::Serialize;

use crate::handlers::utils::load_user;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Company, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    /// Companies the user owns or belongs to
    pub companies: Vec<Company>,
}

/// GET /api/auth/me - current account as stored, not as the token remembers it
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Me> {
    let user = load_user(&state, &auth).await?;
    let companies = state.store.companies_for_user(user.id).await?;
    Ok(ApiResponse::success(Me { user, companies }))
}
