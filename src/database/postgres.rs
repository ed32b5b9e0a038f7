use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::store::{JobScope, Store, StoreError, StoreStats};
use crate::config::DatabaseConfig;
use crate::models::{
    Application, Company, Education, Experience, Job, JobSeekerProfile, Note, ResumeFile,
    TeamMember, TimelineEntry, User,
};

const JOB_COLUMNS: &str = "id, company_id, title, description, location, job_type, experience_level, \
    salary_min, salary_max, skills, status, application_deadline, application_count, view_count, \
    created_by, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, job_id, company_id, applicant_id, status, cover_letter, resume, \
    portfolio_links, timeline, notes, created_at, updated_at";

const COMPANY_COLUMNS: &str = "id, name, description, website, location, industry, size, owner_id, \
    team_members, created_at, updated_at";

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Explains a conditional update that touched no rows.
    async fn stale_or_missing(&self, table: &str, id: Uuid, entity: &str) -> StoreError {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table);
        match sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(&self.pool).await {
            Ok(true) => StoreError::Conflict(format!("{} was changed by another request", entity)),
            Ok(false) => StoreError::NotFound(format!("{} not found", entity)),
            Err(e) => StoreError::Sqlx(e),
        }
    }
}

/// Map unique violations to Conflict, keep everything else as a driver error
fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

fn parse_column<T: FromStr>(value: &str, column: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("unexpected {} value '{}'", column, value)))
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: parse_column(&row.role, "users.role")?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    website: Option<String>,
    location: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    owner_id: Uuid,
    team_members: Json<Vec<TeamMember>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            description: row.description,
            website: row.website,
            location: row.location,
            industry: row.industry,
            size: row.size,
            owner: row.owner_id,
            team_members: row.team_members.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    company_id: Uuid,
    title: String,
    description: String,
    location: Option<String>,
    job_type: String,
    experience_level: Option<String>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    skills: Vec<String>,
    status: String,
    application_deadline: Option<DateTime<Utc>>,
    application_count: i64,
    view_count: i64,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let experience_level = match row.experience_level.as_deref() {
            Some(level) => Some(parse_column(level, "jobs.experience_level")?),
            None => None,
        };
        Ok(Job {
            id: row.id,
            company: row.company_id,
            title: row.title,
            description: row.description,
            location: row.location,
            job_type: parse_column(&row.job_type, "jobs.job_type")?,
            experience_level,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            skills: row.skills,
            status: parse_column(&row.status, "jobs.status")?,
            application_deadline: row.application_deadline,
            application_count: row.application_count,
            view_count: row.view_count,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    company_id: Uuid,
    applicant_id: Uuid,
    status: String,
    cover_letter: Option<String>,
    resume: Option<Json<ResumeFile>>,
    portfolio_links: Vec<String>,
    timeline: Json<Vec<TimelineEntry>>,
    notes: Json<Vec<Note>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Application {
            id: row.id,
            job: row.job_id,
            company: row.company_id,
            applicant: row.applicant_id,
            status: parse_column(&row.status, "applications.status")?,
            cover_letter: row.cover_letter,
            resume: row.resume.map(|r| r.0),
            portfolio_links: row.portfolio_links,
            timeline: row.timeline.0,
            notes: row.notes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: Uuid,
    headline: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    skills: Vec<String>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    portfolio_links: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for JobSeekerProfile {
    fn from(row: ProfileRow) -> Self {
        JobSeekerProfile {
            user: row.user_id,
            headline: row.headline,
            summary: row.summary,
            location: row.location,
            skills: row.skills,
            experience: row.experience.0,
            education: row.education.0,
            portfolio_links: row.portfolio_links,
            updated_at: row.updated_at,
        }
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already registered"))?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, password_hash, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        sqlx::query(
            "INSERT INTO companies (id, name, description, website, location, industry, size,
                                    owner_id, team_members, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.location)
        .bind(&company.industry)
        .bind(&company.size)
        .bind(company.owner)
        .bind(Json(&company.team_members))
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(company)
    }

    async fn update_company(&self, company: Company, seen: DateTime<Utc>) -> Result<Company, StoreError> {
        let result = sqlx::query(
            "UPDATE companies
             SET name = $2, description = $3, website = $4, location = $5, industry = $6,
                 size = $7, team_members = $8, updated_at = $9
             WHERE id = $1 AND updated_at = $10",
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.location)
        .bind(&company.industry)
        .bind(&company.size)
        .bind(Json(&company.team_members))
        .bind(company.updated_at)
        .bind(seen)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.stale_or_missing("companies", company.id, "Company").await);
        }
        Ok(company)
    }

    async fn company_by_id(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Company::from))
    }

    async fn companies_for_user(&self, user: Uuid) -> Result<Vec<Company>, StoreError> {
        let sql = format!(
            "SELECT {} FROM companies
             WHERE owner_id = $1
                OR team_members @> jsonb_build_array(jsonb_build_object('user', $1::text))
             ORDER BY created_at",
            COMPANY_COLUMNS
        );
        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Company::from).collect())
    }

    async fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let sql = format!(
            "INSERT INTO jobs ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            JOB_COLUMNS
        );
        sqlx::query(&sql)
            .bind(job.id)
            .bind(job.company)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.location)
            .bind(job.job_type.as_str())
            .bind(job.experience_level.map(|l| l.as_str()))
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.skills)
            .bind(job.status.as_str())
            .bind(job.application_deadline)
            .bind(job.application_count)
            .bind(job.view_count)
            .bind(job.created_by)
            .bind(job.created_at)
            .bind(job.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(job)
    }

    async fn update_job(&self, job: Job) -> Result<Job, StoreError> {
        let sql = format!(
            "UPDATE jobs
             SET title = $2, description = $3, location = $4, job_type = $5, experience_level = $6,
                 salary_min = $7, salary_max = $8, skills = $9, status = $10,
                 application_deadline = $11, updated_at = $12
             WHERE id = $1
             RETURNING {}",
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.id)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.location)
            .bind(job.job_type.as_str())
            .bind(job.experience_level.map(|l| l.as_str()))
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.skills)
            .bind(job.status.as_str())
            .bind(job.application_deadline)
            .bind(job.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Job not found".into()))?;
        Job::try_from(row)
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<Job>, StoreError> {
        let rows = match scope {
            JobScope::Active => {
                let sql = format!("SELECT {} FROM jobs WHERE status = 'active'", JOB_COLUMNS);
                sqlx::query_as::<_, JobRow>(&sql).fetch_all(&self.pool).await?
            }
            JobScope::Company(company) => {
                let sql = format!("SELECT {} FROM jobs WHERE company_id = $1", JOB_COLUMNS);
                sqlx::query_as::<_, JobRow>(&sql)
                    .bind(company)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        collect(rows)
    }

    async fn record_job_view(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE jobs SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> Result<Vec<Application>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM applications WHERE job_id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        );
        let removed = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM bookmarks WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound("Job not found".into()));
        }
        tx.commit().await?;
        collect(removed)
    }

    async fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO applications ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            APPLICATION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(application.id)
            .bind(application.job)
            .bind(application.company)
            .bind(application.applicant)
            .bind(application.status.as_str())
            .bind(&application.cover_letter)
            .bind(application.resume.as_ref().map(Json))
            .bind(&application.portfolio_links)
            .bind(Json(&application.timeline))
            .bind(Json(&application.notes))
            .bind(application.created_at)
            .bind(application.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "You have already applied to this job"))?;

        let result = sqlx::query("UPDATE jobs SET application_count = application_count + 1 WHERE id = $1")
            .bind(application.job)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound("Job not found".into()));
        }

        tx.commit().await?;
        Ok(application)
    }

    async fn update_application(
        &self,
        application: Application,
        seen: DateTime<Utc>,
    ) -> Result<Application, StoreError> {
        let result = sqlx::query(
            "UPDATE applications
             SET status = $2, timeline = $3, notes = $4, updated_at = $5
             WHERE id = $1 AND updated_at = $6",
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(Json(&application.timeline))
        .bind(Json(&application.notes))
        .bind(application.updated_at)
        .bind(seen)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.stale_or_missing("applications", application.id, "Application").await);
        }
        Ok(application)
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Application::try_from).transpose()
    }

    async fn applications_for_job(&self, job: Uuid) -> Result<Vec<Application>, StoreError> {
        let sql = format!("SELECT {} FROM applications WHERE job_id = $1", APPLICATION_COLUMNS);
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(job)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn applications_for_applicant(&self, applicant: Uuid) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(applicant)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn toggle_bookmark(&self, user: Uuid, job: Uuid) -> Result<bool, StoreError> {
        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND job_id = $2")
            .bind(user)
            .bind(job)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO bookmarks (user_id, job_id, created_at) VALUES ($1, $2, now())")
            .bind(user)
            .bind(job)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                    StoreError::NotFound("Job not found".into())
                }
                _ => StoreError::Sqlx(e),
            })?;
        Ok(true)
    }

    async fn bookmarked_jobs(&self, user: Uuid) -> Result<Vec<Job>, StoreError> {
        let columns: Vec<String> = JOB_COLUMNS
            .split(',')
            .map(|c| format!("j.{}", c.trim()))
            .collect();
        let sql = format!(
            "SELECT {} FROM bookmarks b JOIN jobs j ON j.id = b.job_id
             WHERE b.user_id = $1 ORDER BY b.created_at DESC",
            columns.join(", ")
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn profile_for(&self, user: Uuid) -> Result<Option<JobSeekerProfile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, headline, summary, location, skills, experience, education,
                    portfolio_links, updated_at
             FROM profiles WHERE user_id = $1",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobSeekerProfile::from))
    }

    async fn upsert_profile(&self, profile: JobSeekerProfile) -> Result<JobSeekerProfile, StoreError> {
        sqlx::query(
            "INSERT INTO profiles (user_id, headline, summary, location, skills, experience,
                                   education, portfolio_links, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (user_id) DO UPDATE
             SET headline = EXCLUDED.headline, summary = EXCLUDED.summary,
                 location = EXCLUDED.location, skills = EXCLUDED.skills,
                 experience = EXCLUDED.experience, education = EXCLUDED.education,
                 portfolio_links = EXCLUDED.portfolio_links, updated_at = EXCLUDED.updated_at",
        )
        .bind(profile.user)
        .bind(&profile.headline)
        .bind(&profile.summary)
        .bind(&profile.location)
        .bind(&profile.skills)
        .bind(Json(&profile.experience))
        .bind(Json(&profile.education))
        .bind(&profile.portfolio_links)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (users, companies, jobs, active_jobs, applications): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM companies),
                    (SELECT COUNT(*) FROM jobs),
                    (SELECT COUNT(*) FROM jobs WHERE status = 'active'),
                    (SELECT COUNT(*) FROM applications)",
            )
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreStats {
            users,
            companies,
            jobs,
            active_jobs,
            applications,
        })
    }
}
