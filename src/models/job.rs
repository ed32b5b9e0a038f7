use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    pub enum JobType {
        FullTime => "full-time",
        PartTime => "part-time",
        Contract => "contract",
        Internship => "internship",
        Remote => "remote",
    }
}

string_enum! {
    pub enum ExperienceLevel {
        Entry => "entry",
        Mid => "mid",
        Senior => "senior",
        Lead => "lead",
    }
}

string_enum! {
    /// Only `active` jobs are listed publicly and accept applications.
    pub enum JobStatus {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
        Closed => "closed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub company: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub job_type: JobType,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub application_deadline: Option<DateTime<Utc>>,
    pub application_count: i64,
    pub view_count: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.application_deadline.is_some_and(|deadline| deadline < now)
    }

    /// Visible in public listings and accepting applications
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Active && !self.deadline_passed(now)
    }
}
