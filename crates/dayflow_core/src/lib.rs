//! Core domain logic for Dayflow.
//! This crate is the single source of truth for task business invariants.

pub mod logging;
pub mod model;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskId, DEFAULT_SORT_NO};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
