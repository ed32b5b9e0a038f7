// handlers/utils.rs - helpers shared by every handler tier

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Application, Company, Job, User};
use crate::policy::{Capability, CompanyAccess};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PORTFOLIO_LINKS: usize = 10;
pub const MAX_COVER_LETTER_LEN: usize = 5000;

/// `Json<T>` whose rejections use the standard error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Collects per-field problems and turns them into one validation error.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| problem.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, problem: &str) {
        if !ok {
            self.add(field, problem);
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

/// Malformed ids cannot name an existing record, so they read as 404.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

pub fn validate_email_format(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// At least MIN_PASSWORD_LEN characters with one letter and one digit
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a letter and a digit".to_string());
    }
    Ok(())
}

/// Absolute http(s) URL, normalized by the url crate
pub fn normalize_link(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| format!("'{}' is not a valid URL: {}", raw.trim(), e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(format!("'{}' must be an http or https URL", raw.trim())),
    }
}

pub fn normalize_links(raw: &[String]) -> Result<Vec<String>, String> {
    let links: Vec<&String> = raw.iter().filter(|l| !l.trim().is_empty()).collect();
    if links.len() > MAX_PORTFOLIO_LINKS {
        return Err(format!("At most {} links are allowed", MAX_PORTFOLIO_LINKS));
    }
    links.into_iter().map(|l| normalize_link(l)).collect()
}

/// Trimmed, de-duplicated (case-insensitive), empty entries dropped
pub fn normalize_list(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            out.push(item.to_string());
        }
    }
    out
}

/// Blank strings become `None`
pub fn clean(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    state
        .store
        .user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))
}

pub async fn load_company(state: &AppState, id: Uuid) -> Result<Company, ApiError> {
    state
        .store
        .company_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))
}

pub async fn load_job(state: &AppState, id: Uuid) -> Result<Job, ApiError> {
    state
        .store
        .job_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

pub async fn load_application(state: &AppState, id: Uuid) -> Result<Application, ApiError> {
    state
        .store
        .application_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))
}

/// Load a company and run the authorization gate. Callers outside the gate
/// get the same 404 as for a company that does not exist.
pub async fn gated_company(
    state: &AppState,
    id: Uuid,
    auth: &AuthUser,
    capability: Capability,
) -> Result<(Company, CompanyAccess), ApiError> {
    let company = load_company(state, id).await?;
    let access = CompanyAccess::resolve(&company, auth.user_id);
    if !access.allows(capability) {
        tracing::debug!(
            "User {} lacks {:?} on company {} ({:?})",
            auth.user_id,
            capability,
            company.id,
            access
        );
        return Err(ApiError::not_found("Company not found"));
    }
    Ok((company, access))
}

/// Job plus the gate result for its company; 404 for outsiders.
pub async fn gated_job(
    state: &AppState,
    id: Uuid,
    auth: &AuthUser,
    capability: Capability,
) -> Result<(Job, Company), ApiError> {
    let job = load_job(state, id).await?;
    let (company, _) = gated_company(state, job.company, auth, capability)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::not_found("Job not found"),
            other => other,
        })?;
    Ok((job, company))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(validate_email_format("ada@example.com"));
        assert!(validate_email_format("  a.b+c@sub.example.org "));
        assert!(!validate_email_format("ada"));
        assert!(!validate_email_format("@example.com"));
        assert!(!validate_email_format("ada@localhost"));
        assert!(!validate_email_format("ada@example.com."));
        assert!(!validate_email_format("a da@example.com"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("hunter22").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("lettersonly").is_err());
        assert!(validate_password("1234567890").is_err());
    }

    #[test]
    fn links_must_be_http() {
        assert_eq!(normalize_link("https://example.com").unwrap(), "https://example.com/");
        assert!(normalize_link("ftp://example.com").is_err());
        assert!(normalize_link("not a url").is_err());
        assert!(normalize_link("mailto:ada@example.com").is_err());
    }

    #[test]
    fn link_lists_skip_blanks_and_cap_length() {
        let links = vec!["https://a.dev".to_string(), " ".to_string()];
        assert_eq!(normalize_links(&links).unwrap(), vec!["https://a.dev/"]);

        let too_many: Vec<String> = (0..=MAX_PORTFOLIO_LINKS)
            .map(|i| format!("https://site{}.dev", i))
            .collect();
        assert!(normalize_links(&too_many).is_err());
    }

    #[test]
    fn list_normalization_dedupes() {
        let skills = vec![" Rust ".to_string(), "rust".to_string(), "".to_string(), "SQL".to_string()];
        assert_eq!(normalize_list(&skills), vec!["Rust", "SQL"]);
    }

    #[test]
    fn field_errors_keep_first_problem() {
        let mut errors = FieldErrors::new();
        errors.check(true, "name", "required");
        assert!(FieldErrors::new().finish().is_ok());
        errors.add("email", "invalid");
        errors.add("email", "taken");
        match errors.finish() {
            Err(ApiError::ValidationError { field_errors: Some(map), .. }) => {
                assert_eq!(map.get("email").map(String::as_str), Some("invalid"));
                assert!(!map.contains_key("name"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
