// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) -> Protected (JWT auth) -> Admin (JWT auth + ADMIN_EMAILS)
// Tier membership is decided by the router in `app.rs`; handlers themselves
// only extract what their tier guarantees.

pub mod admin;
pub mod protected;
pub mod public;
pub mod utils;
