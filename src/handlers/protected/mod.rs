// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Routed behind `jwt_auth_middleware`; every handler takes `AuthUser`.
// Company-scoped handlers go through `policy::CompanyAccess` via the gated
// loaders in `handlers::utils`.

pub mod applications;
pub mod auth;
pub mod bookmarks;
pub mod company;
pub mod jobs;
pub mod profile;

pub use applications::{
    add_note as application_add_note, for_job as job_applications, get as application_get,
    mine as applications_mine, resume as application_resume, set_status as application_set_status,
    submit as application_submit, withdraw as application_withdraw,
};
pub use auth::me as auth_me;
pub use bookmarks::{list as bookmarks_list, toggle as bookmark_toggle};
pub use company::{
    create as company_create, jobs as company_jobs, mine as companies_mine, team_add,
    team_list, team_remove, team_update, update as company_update,
};
pub use jobs::{
    create as job_create, delete as job_delete, set_status as job_set_status, update as job_update,
};
pub use profile::{get as profile_get, put as profile_put};
