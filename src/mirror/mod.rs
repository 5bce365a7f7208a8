//! Mirror module
//!
//! Keeps storage populated with the latest snapshot of the configured
//! repository branch.

pub mod archive;
pub mod job;
pub mod scheduler;

pub use archive::{extract, ArchiveEntry};
pub use job::{refresh, run_refresh, write_entries, RefreshReport};
pub use scheduler::run_scheduler;
