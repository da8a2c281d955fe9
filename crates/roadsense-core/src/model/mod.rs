//! Persisted data model

pub mod report;
pub mod user;

pub use report::{new_report_id, PotholeReport};
pub use user::{User, UserRole};
