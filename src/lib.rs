//! dotmirror: mirrors a GitHub repository's branch archive into a blob
//! store and serves it back over HTTP together with a bootstrap script.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod mirror;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
