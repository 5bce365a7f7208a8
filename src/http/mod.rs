//! HTTP protocol layer module
//!
//! Content-type classification, entity tags, and response builders shared by
//! the request router and the mirror job.

pub mod etag;
pub mod mime;
pub mod response;

pub use response::{
    build_403_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_blob_response, build_script_response, build_text_response,
    with_server_name,
};
