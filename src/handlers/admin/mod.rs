// handlers/admin/mod.rs - Admin handlers (JWT + ADMIN_EMAILS allow-list)
//
// Routed behind `jwt_auth_middleware` and `require_admin_middleware`.

use axum::extract::State;

use crate::database::StoreStats;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::User;
use crate::state::AppState;

/// GET /api/admin/stats - record counts across the board
pub async fn stats(State(state): State<AppState>) -> ApiResult<StoreStats> {
    let stats = state.store.stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/admin/users - every account, newest first
pub async fn users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let mut users = state.store.list_users().await?;
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(ApiResponse::success(users))
}
