use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{admin, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware, ApiResponse, ApiResult};
use crate::state::AppState;

/// Multipart overhead allowed on top of the resume size limit
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

/// Full application router with every tier and the global layers.
pub fn app(state: AppState) -> Router {
    let body_limit = state
        .config
        .api
        .max_request_size_bytes
        .max(state.config.uploads.max_resume_bytes + MULTIPART_SLACK_BYTES);

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Admin API
        .merge(admin_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config.security));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        // Token acquisition
        .route("/api/auth/register", post(public::auth_register))
        .route("/api/auth/login", post(public::auth_login))
        // Job board
        .route("/api/jobs", get(public::jobs_list))
        .route("/api/jobs/:id", get(public::job_get))
        .route("/api/company/:id", get(public::company_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(protected::auth_me))
        // Companies and teams
        .route("/api/company", post(protected::company_create))
        .route("/api/company/mine", get(protected::companies_mine))
        .route("/api/company/:id", axum::routing::put(protected::company_update))
        .route(
            "/api/company/:id/team",
            get(protected::team_list).post(protected::team_add),
        )
        .route(
            "/api/company/:id/team/:user_id",
            patch(protected::team_update).delete(protected::team_remove),
        )
        .route("/api/company/:id/jobs", get(protected::company_jobs))
        // Jobs
        .route("/api/jobs", post(protected::job_create))
        .route("/api/jobs/bookmarks", get(protected::bookmarks_list))
        .route(
            "/api/jobs/:id",
            axum::routing::put(protected::job_update).delete(protected::job_delete),
        )
        .route("/api/jobs/:id/status", patch(protected::job_set_status))
        .route("/api/jobs/:id/bookmark", post(protected::bookmark_toggle))
        .route("/api/jobs/:id/applications", get(protected::job_applications))
        // Applications
        .route("/api/applications", post(protected::application_submit))
        .route("/api/applications/mine", get(protected::applications_mine))
        .route("/api/applications/:id", get(protected::application_get))
        .route("/api/applications/:id/status", patch(protected::application_set_status))
        .route("/api/applications/:id/withdraw", post(protected::application_withdraw))
        .route("/api/applications/:id/notes", post(protected::application_add_note))
        .route("/api/applications/:id/resume", get(protected::application_resume))
        // Job seeker profile
        .route("/api/profile", get(protected::profile_get).put(protected::profile_put))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    // Layers wrap outward: the JWT layer runs first and feeds AuthUser to the admin gate.
    Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users", get(admin::users))
        .route_layer(from_fn_with_state(state.clone(), require_admin_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Job Board API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Companies, job postings, applications and job seeker profiles",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public), /api/auth/me (protected)",
            "jobs": "/api/jobs[/:id] (public read, protected write)",
            "company": "/api/company[/:id[/team|/jobs]] (public profile, protected management)",
            "applications": "/api/applications[/:id] (protected)",
            "profile": "/api/profile (protected, job seekers)",
            "admin": "/api/admin/* (restricted to ADMIN_EMAILS)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}
