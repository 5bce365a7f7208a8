//! MIME type detection module
//!
//! Maps a file name to the Content-Type stored with mirrored blobs.

/// Content type used when the extension is unknown or missing
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Get MIME Content-Type for a lower-cased file extension
///
/// # Examples
/// ```
/// use dotmirror::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("qml")), "text/x-qml");
/// assert_eq!(get_content_type(Some("mp4")), "text/plain");
/// assert_eq!(get_content_type(None), "text/plain");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("txt" | "conf") => "text/plain",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("rasi") => "text/rasi",
        Some("qml") => "text/x-qml",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("sh") => "application/x-sh",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",

        // Documents
        Some("pdf") => "application/pdf",

        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Classify a file name by the text after its last `.`, case-insensitively
pub fn classify(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    get_content_type(extension.as_deref())
}
