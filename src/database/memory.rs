use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{JobScope, Store, StoreError, StoreStats};
use crate::models::{Application, Company, Job, JobSeekerProfile, JobStatus, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    companies: HashMap<Uuid, Company>,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
    bookmarks: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    profiles: HashMap<Uuid, JobSeekerProfile>,
}

/// Process-local store used by `serve --memory` and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let t = self.tables.read().await;
        let mut users: Vec<User> = t.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut t = self.tables.write().await;
        t.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn update_company(&self, company: Company, seen: DateTime<Utc>) -> Result<Company, StoreError> {
        let mut t = self.tables.write().await;
        match t.companies.get_mut(&company.id) {
            Some(existing) if existing.updated_at != seen => Err(StoreError::Conflict(
                "Company was changed by another request".into(),
            )),
            Some(existing) => {
                *existing = company.clone();
                Ok(company)
            }
            None => Err(StoreError::NotFound("Company not found".into())),
        }
    }

    async fn company_by_id(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        Ok(self.tables.read().await.companies.get(&id).cloned())
    }

    async fn companies_for_user(&self, user: Uuid) -> Result<Vec<Company>, StoreError> {
        let t = self.tables.read().await;
        let mut companies: Vec<Company> = t
            .companies
            .values()
            .filter(|c| c.involves(user))
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(companies)
    }

    async fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut t = self.tables.write().await;
        if !t.companies.contains_key(&job.company) {
            return Err(StoreError::NotFound("Company not found".into()));
        }
        t.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut t = self.tables.write().await;
        let existing = t
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| StoreError::NotFound("Job not found".into()))?;
        let application_count = existing.application_count;
        let view_count = existing.view_count;
        *existing = Job {
            application_count,
            view_count,
            ..job
        };
        Ok(existing.clone())
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<Job>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.jobs
            .values()
            .filter(|j| match scope {
                JobScope::Active => j.status == JobStatus::Active,
                JobScope::Company(company) => j.company == company,
            })
            .cloned()
            .collect())
    }

    async fn record_job_view(&self, id: Uuid) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        if let Some(job) = t.jobs.get_mut(&id) {
            job.view_count += 1;
        }
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> Result<Vec<Application>, StoreError> {
        let mut t = self.tables.write().await;
        if t.jobs.remove(&id).is_none() {
            return Err(StoreError::NotFound("Job not found".into()));
        }
        let removed_ids: Vec<Uuid> = t
            .applications
            .values()
            .filter(|a| a.job == id)
            .map(|a| a.id)
            .collect();
        let removed = removed_ids
            .iter()
            .filter_map(|app_id| t.applications.remove(app_id))
            .collect();
        t.bookmarks.retain(|(_, job), _| *job != id);
        Ok(removed)
    }

    async fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut t = self.tables.write().await;
        let duplicate = t
            .applications
            .values()
            .any(|a| a.job == application.job && a.applicant == application.applicant);
        if duplicate {
            return Err(StoreError::Conflict("You have already applied to this job".into()));
        }
        let job = t
            .jobs
            .get_mut(&application.job)
            .ok_or_else(|| StoreError::NotFound("Job not found".into()))?;
        job.application_count += 1;
        t.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn update_application(
        &self,
        application: Application,
        seen: DateTime<Utc>,
    ) -> Result<Application, StoreError> {
        let mut t = self.tables.write().await;
        match t.applications.get_mut(&application.id) {
            Some(existing) if existing.updated_at != seen => Err(StoreError::Conflict(
                "Application was changed by another request".into(),
            )),
            Some(existing) => {
                *existing = application.clone();
                Ok(application)
            }
            None => Err(StoreError::NotFound("Application not found".into())),
        }
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn applications_for_job(&self, job: Uuid) -> Result<Vec<Application>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.applications.values().filter(|a| a.job == job).cloned().collect())
    }

    async fn applications_for_applicant(&self, applicant: Uuid) -> Result<Vec<Application>, StoreError> {
        let t = self.tables.read().await;
        let mut apps: Vec<Application> = t
            .applications
            .values()
            .filter(|a| a.applicant == applicant)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn toggle_bookmark(&self, user: Uuid, job: Uuid) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if !t.jobs.contains_key(&job) {
            return Err(StoreError::NotFound("Job not found".into()));
        }
        if t.bookmarks.remove(&(user, job)).is_some() {
            Ok(false)
        } else {
            t.bookmarks.insert((user, job), Utc::now());
            Ok(true)
        }
    }

    async fn bookmarked_jobs(&self, user: Uuid) -> Result<Vec<Job>, StoreError> {
        let t = self.tables.read().await;
        let mut marked: Vec<(&DateTime<Utc>, &Uuid)> = t
            .bookmarks
            .iter()
            .filter(|((u, _), _)| *u == user)
            .map(|((_, job), at)| (at, job))
            .collect();
        marked.sort_by(|a, b| b.0.cmp(a.0));
        Ok(marked
            .into_iter()
            .filter_map(|(_, job)| t.jobs.get(job).cloned())
            .collect())
    }

    async fn profile_for(&self, user: Uuid) -> Result<Option<JobSeekerProfile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user).cloned())
    }

    async fn upsert_profile(&self, profile: JobSeekerProfile) -> Result<JobSeekerProfile, StoreError> {
        let mut t = self.tables.write().await;
        t.profiles.insert(profile.user, profile.clone());
        Ok(profile)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let t = self.tables.read().await;
        let active_jobs = t
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Active)
            .count();
        Ok(StoreStats {
            users: t.users.len() as i64,
            companies: t.companies.len() as i64,
            jobs: t.jobs.len() as i64,
            active_jobs: active_jobs as i64,
            applications: t.applications.len() as i64,
        })
    }
}
