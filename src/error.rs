//! Crate error types
//!
//! Request-path errors are mapped to HTTP status codes by the router;
//! refresh-path errors abort the current mirror cycle.

use hyper::{Method, StatusCode};

use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request not authorized")]
    AuthorizationDenied,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("method not supported: {0}")]
    MethodNotSupported(Method),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("failed to fetch archive from {url}: {reason}")]
    UpstreamFetchFailed { url: String, reason: String },

    #[error("failed to decode archive: {0}")]
    ArchiveDecodeFailed(String),

    #[error("storage operation failed: {0}")]
    StorageOperationFailed(#[from] StorageError),

    #[error("failed to read request body: {0}")]
    Body(String),
}

impl Error {
    /// Status code returned to HTTP callers for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::AuthorizationDenied => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamFetchFailed { .. }
            | Self::ArchiveDecodeFailed(_)
            | Self::StorageOperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ArchiveDecodeFailed(err.to_string())
    }
}
