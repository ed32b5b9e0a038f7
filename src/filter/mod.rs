pub mod error;
pub mod filter_order;
pub mod listing;
pub mod types;

pub use error::FilterError;
pub use listing::{ApplicationFilter, JobFilter};
pub use types::*;
