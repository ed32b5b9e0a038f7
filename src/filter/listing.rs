use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{ApplicationQuery, JobQuery, JobSort, Page, PageRequest, SortDirection};
use crate::config::ListingConfig;
use crate::models::{Application, ApplicationStatus, ExperienceLevel, Job, JobStatus, JobType};

/// Parsed job listing criteria
#[derive(Debug, Clone)]
pub struct JobFilter {
    text: Option<String>,
    location: Option<String>,
    job_type: Option<JobType>,
    experience_level: Option<ExperienceLevel>,
    company: Option<Uuid>,
    salary_min: Option<i64>,
    status: Option<JobStatus>,
    open_at: Option<DateTime<Utc>>,
    sort: JobSort,
    page: PageRequest,
}

impl JobFilter {
    pub fn from_query(query: &JobQuery, listing: &ListingConfig) -> Result<Self, FilterError> {
        Ok(Self {
            text: lowered(query.q.as_deref()),
            location: lowered(query.location.as_deref()),
            job_type: parse_opt(query.job_type.as_deref(), "jobType")?,
            experience_level: parse_opt(query.experience_level.as_deref(), "experienceLevel")?,
            company: parse_opt(query.company.as_deref(), "company")?,
            salary_min: parse_opt(query.salary_min.as_deref(), "salaryMin")?,
            status: parse_opt(query.status.as_deref(), "status")?,
            open_at: None,
            sort: FilterOrder::job_sort(query.sort.as_deref())?,
            page: FilterOrder::page_request(query.page.as_deref(), query.limit.as_deref(), listing)?,
        })
    }

    /// Restrict to jobs accepting applications at `now` (public listings).
    pub fn open_only(mut self, now: DateTime<Utc>) -> Self {
        self.open_at = Some(now);
        self
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(now) = self.open_at {
            if !job.is_open(now) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let hit = job.title.to_lowercase().contains(text)
                || job.description.to_lowercase().contains(text)
                || job.skills.iter().any(|s| s.to_lowercase().contains(text));
            if !hit {
                return false;
            }
        }
        if let Some(location) = &self.location {
            let hit = job
                .location
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(location));
            if !hit {
                return false;
            }
        }
        if self.job_type.is_some_and(|t| job.job_type != t) {
            return false;
        }
        if self.experience_level.is_some() && job.experience_level != self.experience_level {
            return false;
        }
        if self.company.is_some_and(|c| job.company != c) {
            return false;
        }
        if let Some(min) = self.salary_min {
            if !job.salary_max.is_some_and(|max| max >= min) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, jobs: Vec<Job>) -> Page<Job> {
        let mut jobs: Vec<Job> = jobs.into_iter().filter(|j| self.matches(j)).collect();
        sort_jobs(&mut jobs, self.sort);
        paginate(jobs, self.page)
    }
}

fn sort_jobs(jobs: &mut [Job], sort: JobSort) {
    match sort {
        JobSort::Newest => jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        JobSort::Oldest => jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        // None < Some, so reversing the comparison puts unpaid listings last
        JobSort::Salary => jobs.sort_by(|a, b| {
            b.salary_max
                .cmp(&a.salary_max)
                .then(b.created_at.cmp(&a.created_at))
        }),
        JobSort::Deadline => jobs.sort_by(|a, b| {
            (a.application_deadline.is_none(), a.application_deadline)
                .cmp(&(b.application_deadline.is_none(), b.application_deadline))
                .then(b.created_at.cmp(&a.created_at))
        }),
        JobSort::Popular => jobs.sort_by(|a, b| {
            b.application_count
                .cmp(&a.application_count)
                .then(b.created_at.cmp(&a.created_at))
        }),
    }
}

/// Parsed application list criteria
#[derive(Debug, Clone)]
pub struct ApplicationFilter {
    status: Option<ApplicationStatus>,
    direction: SortDirection,
    page: PageRequest,
}

impl ApplicationFilter {
    pub fn from_query(query: &ApplicationQuery, listing: &ListingConfig) -> Result<Self, FilterError> {
        Ok(Self {
            status: parse_opt(query.status.as_deref(), "status")?,
            direction: FilterOrder::direction(query.sort.as_deref())?,
            page: FilterOrder::page_request(query.page.as_deref(), query.limit.as_deref(), listing)?,
        })
    }

    pub fn apply(&self, applications: Vec<Application>) -> Page<Application> {
        let mut applications: Vec<Application> = applications
            .into_iter()
            .filter(|a| self.status.map_or(true, |s| a.status == s))
            .collect();
        match self.direction {
            SortDirection::Asc => applications.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortDirection::Desc => applications.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        paginate(applications, self.page)
    }
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let skip = (request.page as usize - 1).saturating_mul(request.limit as usize);
    let items = items
        .into_iter()
        .skip(skip)
        .take(request.limit as usize)
        .collect();
    Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
    }
}

fn lowered(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

fn parse_opt<T: std::str::FromStr>(raw: Option<&str>, field: &'static str) -> Result<Option<T>, FilterError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|_| FilterError::InvalidValue {
            field,
            value: s.to_string(),
        }),
    }
}
