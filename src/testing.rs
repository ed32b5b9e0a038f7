// Fixtures shared by unit tests across modules.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Company, ExperienceLevel, Job, JobStatus, JobType, TeamMember, TeamRole, User, UserRole,
};

pub fn sample_user(role: UserRole) -> User {
    let id = Uuid::new_v4();
    User::new(&format!("user-{}@example.com", id.simple()), "Sample User", role, String::new())
}

pub fn sample_company(owner: Uuid) -> Company {
    let now = Utc::now();
    Company {
        id: Uuid::new_v4(),
        name: "Acme Corp".into(),
        description: Some("Widgets".into()),
        website: Some("https://acme.example.com".into()),
        location: Some("Berlin".into()),
        industry: Some("Manufacturing".into()),
        size: Some("51-200".into()),
        owner,
        team_members: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn with_member(mut company: Company, user: Uuid, role: TeamRole) -> Company {
    company.team_members.push(TeamMember {
        user,
        role,
        permissions: Vec::new(),
        added_at: Utc::now(),
    });
    company
}

pub fn sample_job(status: JobStatus, deadline: Option<DateTime<Utc>>) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        company: Uuid::new_v4(),
        title: "Backend Engineer".into(),
        description: "Build APIs".into(),
        location: Some("Berlin".into()),
        job_type: JobType::FullTime,
        experience_level: Some(ExperienceLevel::Mid),
        salary_min: Some(50_000),
        salary_max: Some(70_000),
        skills: vec!["rust".into()],
        status,
        application_deadline: deadline,
        application_count: 0,
        view_count: 0,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}
