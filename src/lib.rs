pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod state;
pub mod uploads;

#[cfg(test)]
pub mod testing;
