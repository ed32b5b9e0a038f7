//! Company authorization gate.
//!
//! Every handler that acts on a company's jobs, team or applications asks this
//! module, so the role sets below are the only definition of who may do what.

use uuid::Uuid;

use crate::models::{Company, TeamRole};

/// Team roles allowed to manage jobs and applications.
pub const JOB_MANAGER_ROLES: &[TeamRole] = &[
    TeamRole::Admin,
    TeamRole::Recruiter,
    TeamRole::Manager,
    TeamRole::Hr,
];

/// Team roles allowed to edit the company profile and team list.
pub const TEAM_MANAGER_ROLES: &[TeamRole] = &[TeamRole::Admin];

/// What a handler needs the caller to be able to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    View,
    ManageJobs,
    ManageTeam,
}

/// Relationship between a user and a company
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyAccess {
    Owner,
    Team(TeamRole),
    None,
}

impl CompanyAccess {
    /// Owner id equality first, then a scan of the team list.
    pub fn resolve(company: &Company, user: Uuid) -> Self {
        if company.owner == user {
            return CompanyAccess::Owner;
        }
        match company.member(user) {
            Some(member) => CompanyAccess::Team(member.role),
            None => CompanyAccess::None,
        }
    }

    pub fn allows(self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.can_view(),
            Capability::ManageJobs => self.can_manage_jobs(),
            Capability::ManageTeam => self.can_manage_team(),
        }
    }

    pub fn can_view(self) -> bool {
        !matches!(self, CompanyAccess::None)
    }

    pub fn can_manage_jobs(self) -> bool {
        match self {
            CompanyAccess::Owner => true,
            CompanyAccess::Team(role) => JOB_MANAGER_ROLES.contains(&role),
            CompanyAccess::None => false,
        }
    }

    pub fn can_manage_team(self) -> bool {
        match self {
            CompanyAccess::Owner => true,
            CompanyAccess::Team(role) => TEAM_MANAGER_ROLES.contains(&role),
            CompanyAccess::None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_company, with_member};

    #[test]
    fn owner_has_full_access() {
        let owner = Uuid::new_v4();
        let company = sample_company(owner);
        let access = CompanyAccess::resolve(&company, owner);
        assert_eq!(access, CompanyAccess::Owner);
        assert!(access.can_view() && access.can_manage_jobs() && access.can_manage_team());
    }

    #[test]
    fn hiring_roles_manage_jobs_but_not_team() {
        for role in [TeamRole::Recruiter, TeamRole::Manager, TeamRole::Hr] {
            let user = Uuid::new_v4();
            let company = with_member(sample_company(Uuid::new_v4()), user, role);
            let access = CompanyAccess::resolve(&company, user);
            assert_eq!(access, CompanyAccess::Team(role));
            assert!(access.can_manage_jobs(), "{role} should manage jobs");
            assert!(!access.can_manage_team(), "{role} should not manage team");
        }
    }

    #[test]
    fn team_admin_manages_everything() {
        let user = Uuid::new_v4();
        let company = with_member(sample_company(Uuid::new_v4()), user, TeamRole::Admin);
        let access = CompanyAccess::resolve(&company, user);
        assert!(access.can_manage_jobs() && access.can_manage_team());
    }

    #[test]
    fn plain_member_is_read_only() {
        let user = Uuid::new_v4();
        let company = with_member(sample_company(Uuid::new_v4()), user, TeamRole::Member);
        let access = CompanyAccess::resolve(&company, user);
        assert!(access.can_view());
        assert!(!access.can_manage_jobs());
        assert!(!access.can_manage_team());
        assert!(access.allows(Capability::View));
        assert!(!access.allows(Capability::ManageJobs));
    }

    #[test]
    fn strangers_get_nothing() {
        let company = with_member(sample_company(Uuid::new_v4()), Uuid::new_v4(), TeamRole::Admin);
        let access = CompanyAccess::resolve(&company, Uuid::new_v4());
        assert_eq!(access, CompanyAccess::None);
        assert!(!access.can_view());
    }
}
