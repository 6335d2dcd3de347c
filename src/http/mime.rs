//! Content-type inference from file extensions.

use std::path::Path;

/// Content type used for every error body.
pub const TEXT_PLAIN: &str = "text/plain";

/// Infers a content type from the file's extension, falling back to
/// `application/octet-stream` for unknown or missing extensions.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
