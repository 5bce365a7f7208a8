//! Request handler module
//!
//! HTTP surface of the blob store: installer script, authorization, and
//! storage dispatch.

pub mod auth;
pub mod installer;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
