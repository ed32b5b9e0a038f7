use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Application, Company, Job, JobSeekerProfile, User};

/// Errors from any Store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Which jobs a listing starts from before filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobScope {
    /// Every job with status `active`
    Active,
    /// Every job of one company, any status
    Company(Uuid),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub users: i64,
    pub companies: i64,
    pub jobs: i64,
    pub active_jobs: i64,
    pub applications: i64,
}

/// Persistence for the job board.
///
/// Implementations keep `Job::application_count` equal to the number of stored
/// applications for the job, and reject a second application by the same
/// applicant to the same job with `StoreError::Conflict`.
///
/// Company and application updates are conditional: `seen` is the
/// `updated_at` the caller loaded, and a row that changed since then is left
/// alone and reported as `StoreError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // Users
    /// Conflict when the e-mail is taken
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    // Companies
    async fn insert_company(&self, company: Company) -> Result<Company, StoreError>;
    /// Replaces profile fields and team list
    async fn update_company(&self, company: Company, seen: DateTime<Utc>) -> Result<Company, StoreError>;
    async fn company_by_id(&self, id: Uuid) -> Result<Option<Company>, StoreError>;
    /// Companies the user owns or is a team member of
    async fn companies_for_user(&self, user: Uuid) -> Result<Vec<Company>, StoreError>;

    // Jobs
    async fn insert_job(&self, job: Job) -> Result<Job, StoreError>;
    /// Counters are not touched by updates
    async fn update_job(&self, job: Job) -> Result<Job, StoreError>;
    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError>;
    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<Job>, StoreError>;
    async fn record_job_view(&self, id: Uuid) -> Result<(), StoreError>;
    /// Also removes the job's applications and bookmarks; returns the removed applications
    async fn delete_job(&self, id: Uuid) -> Result<Vec<Application>, StoreError>;

    // Applications
    async fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    /// Replaces status, timeline and notes
    async fn update_application(
        &self,
        application: Application,
        seen: DateTime<Utc>,
    ) -> Result<Application, StoreError>;
    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, StoreError>;
    async fn applications_for_job(&self, job: Uuid) -> Result<Vec<Application>, StoreError>;
    async fn applications_for_applicant(&self, applicant: Uuid) -> Result<Vec<Application>, StoreError>;

    // Bookmarks
    /// Returns whether the job is bookmarked after the call
    async fn toggle_bookmark(&self, user: Uuid, job: Uuid) -> Result<bool, StoreError>;
    async fn bookmarked_jobs(&self, user: Uuid) -> Result<Vec<Job>, StoreError>;

    // Job seeker profiles
    async fn profile_for(&self, user: Uuid) -> Result<Option<JobSeekerProfile>, StoreError>;
    async fn upsert_profile(&self, profile: JobSeekerProfile) -> Result<JobSeekerProfile, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
