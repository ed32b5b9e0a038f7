use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::job::Job;

string_enum! {
    /// Lifecycle label of an application.
    ///
    /// Forward path: pending -> reviewed -> shortlisted -> interview -> accepted.
    /// `rejected` and `withdrawn` end the lifecycle from any non-terminal state.
    pub enum ApplicationStatus {
        Pending => "pending",
        Reviewed => "reviewed",
        Shortlisted => "shortlisted",
        Interview => "interview",
        Accepted => "accepted",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
}

/// Who is requesting a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A user the company authorization gate allows to manage jobs
    Manager,
    Applicant,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Application is already {0}")]
    SameStatus(ApplicationStatus),

    #[error("Application is {0} and can no longer change status")]
    Terminal(ApplicationStatus),

    #[error("Cannot move application from {from} to {to}")]
    NotAllowed {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Position on the forward path; `None` for the exits.
    fn stage(self) -> Option<u8> {
        match self {
            ApplicationStatus::Pending => Some(0),
            ApplicationStatus::Reviewed => Some(1),
            ApplicationStatus::Shortlisted => Some(2),
            ApplicationStatus::Interview => Some(3),
            ApplicationStatus::Accepted => Some(4),
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn => None,
        }
    }

    pub fn check_transition(self, to: ApplicationStatus, actor: Actor) -> Result<(), TransitionError> {
        if self == to {
            return Err(TransitionError::SameStatus(self));
        }
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }

        let allowed = match (actor, to) {
            (Actor::Applicant, ApplicationStatus::Withdrawn) => true,
            (Actor::Applicant, _) => false,
            (Actor::Manager, ApplicationStatus::Rejected) => true,
            (Actor::Manager, ApplicationStatus::Withdrawn) => false,
            (Actor::Manager, _) => match (self.stage(), to.stage()) {
                (Some(from), Some(target)) => target > from,
                _ => false,
            },
        };

        if allowed {
            Ok(())
        } else {
            Err(TransitionError::NotAllowed { from: self, to })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    /// Hex SHA-256 of the stored bytes
    pub checksum: String,
    pub stored_as: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
    pub by: Uuid,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub author: Uuid,
    pub body: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub job: Uuid,
    pub company: Uuid,
    pub applicant: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume: Option<ResumeFile>,
    #[serde(default)]
    pub portfolio_links: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn submit(
        job: &Job,
        applicant: Uuid,
        cover_letter: Option<String>,
        resume: Option<ResumeFile>,
        portfolio_links: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job: job.id,
            company: job.company,
            applicant,
            status: ApplicationStatus::Pending,
            cover_letter,
            resume,
            portfolio_links,
            timeline: vec![TimelineEntry {
                status: ApplicationStatus::Pending,
                at: now,
                by: applicant,
                note: None,
            }],
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status change and record it on the timeline.
    pub fn transition(
        &mut self,
        to: ApplicationStatus,
        actor: Actor,
        by: Uuid,
        note: Option<String>,
    ) -> Result<(), TransitionError> {
        self.status.check_transition(to, actor)?;

        let now = Utc::now();
        self.status = to;
        self.timeline.push(TimelineEntry {
            status: to,
            at: now,
            by,
            note,
        });
        self.updated_at = now;
        Ok(())
    }

    pub fn add_note(&mut self, author: Uuid, body: String) {
        let now = Utc::now();
        self.notes.push(Note { author, body, at: now });
        self.updated_at = now;
    }

    /// What the applicant sees: internal notes are hidden.
    pub fn for_applicant(mut self) -> Self {
        self.notes.clear();
        self
    }
}
