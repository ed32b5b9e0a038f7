use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    /// Role of a user inside a company's team list
    pub enum TeamRole {
        Admin => "admin",
        Recruiter => "recruiter",
        Manager => "manager",
        Hr => "hr",
        Member => "member",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub user: Uuid,
    pub role: TeamRole,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub owner: Uuid,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn member(&self, user: Uuid) -> Option<&TeamMember> {
        self.team_members.iter().find(|m| m.user == user)
    }

    /// Owner or listed team member
    pub fn involves(&self, user: Uuid) -> bool {
        self.owner == user || self.member(user).is_some()
    }

    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            website: self.website.clone(),
            location: self.location.clone(),
            industry: self.industry.clone(),
            size: self.size.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public company profile; owner and team list are not exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}
