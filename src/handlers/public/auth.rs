// handlers/public/auth.rs - POST /api/auth/register, POST /api/auth/login

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, issue_token, verify_password};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::utils::{validate_email_format, validate_password, ApiJson, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{user::normalize_email, User, UserRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to `jobseeker`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register - create an account and sign it in
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<AuthPayload> {
    let mut errors = FieldErrors::new();
    errors.check(validate_email_format(&body.email), "email", "Enter a valid e-mail address");
    if let Err(problem) = validate_password(&body.password) {
        errors.add("password", problem);
    }
    errors.check(!body.name.trim().is_empty(), "name", "Name is required");

    let role = match body.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => UserRole::Jobseeker,
        Some(raw) => match raw.parse::<UserRole>() {
            Ok(role) => role,
            Err(e) => {
                errors.add("role", e.to_string());
                UserRole::Jobseeker
            }
        },
    };
    errors.finish()?;

    let email = normalize_email(&body.email);
    if state.store.user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("An account with this e-mail already exists"));
    }

    let password_hash = hash_password(&body.password, state.config.security.bcrypt_cost).await?;
    let user = User::new(&email, &body.name, role, password_hash);

    let user = match state.store.insert_user(user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::conflict("An account with this e-mail already exists"))
        }
        Err(e) => return Err(e.into()),
    };

    let token = issue_token(&user, &state.config.security)?;
    tracing::info!("Registered {} account {}", user.role, user.id);

    Ok(ApiResponse::created(AuthPayload { token, user }))
}

/// POST /api/auth/login - exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<AuthPayload> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("E-mail and password are required"));
    }

    let email = normalize_email(&body.email);
    let invalid = || ApiError::unauthorized("Invalid e-mail or password");

    let user = state.store.user_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(&body.password, &user.password_hash).await? {
        tracing::warn!("Failed login for {}", email);
        return Err(invalid());
    }

    let token = issue_token(&user, &state.config.security)?;
    tracing::info!("User {} signed in", user.id);

    Ok(ApiResponse::success(AuthPayload { token, user }))
}
