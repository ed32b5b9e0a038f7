use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Admin gate: the authenticated e-mail must appear in the `ADMIN_EMAILS` allow-list.
///
/// Layer this inside `jwt_auth_middleware` so the `AuthUser` is already present.
/// - no authenticated user: 401
/// - allow-list not configured: 500
/// - e-mail not listed: 403
pub async fn require_admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if state.config.security.admin_emails.is_empty() {
        tracing::error!("Admin route requested but ADMIN_EMAILS is not configured");
        return Err(ApiError::internal_server_error("Admin access is not configured"));
    }

    if !state.config.is_admin_email(&auth_user.email) {
        tracing::warn!("Admin access denied for {}", auth_user.email);
        return Err(ApiError::forbidden("Admin access required"));
    }

    tracing::debug!("Admin access granted for {}", auth_user.email);
    Ok(next.run(request).await)
}
