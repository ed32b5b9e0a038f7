// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the read-only job board. `jobs::get` accepts an
// optional bearer token and adds viewer state when one is present.

pub mod auth;
pub mod company;
pub mod jobs;

pub use auth::{login as auth_login, register as auth_register};
pub use company::get as company_get;
pub use jobs::{get as job_get, list as jobs_list};
