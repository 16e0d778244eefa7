//! Process-wide constants shared across assetgate crates.

use std::time::Duration;

/// Validity window for provider-presigned PUT/GET/HEAD URLs.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Applied to uploads when the caller did not supply a cache-control header.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=3600";

/// Default validity of a signed `/upload_form` capability URL.
pub const UPLOAD_FORM_EXPIRY_SECS: u64 = 15 * 60;

/// Upper bound accepted for `expire` on signed download links (7 days).
pub const MAX_SIGN_EXPIRE_SECS: u64 = 7 * 24 * 60 * 60;

/// Default JPEG/WebP encode quality when the pipeline does not set one.
pub const DEFAULT_QUALITY: u8 = 85;

/// Largest accepted width/height/longer/shorter value in a resize operation.
pub const MAX_DIMENSION: u32 = 4096;

/// Hard cap on the number of operations in one transformation pipeline.
pub const MAX_PIPELINE_OPERATIONS: usize = 16;

/// Query parameter carrying the transformation pipeline on GET requests.
pub const PIPELINE_QUERY_PARAM: &str = "pipeline";

/// Maximum objects returned by a single list page.
pub const LIST_PAGE_SIZE: usize = 1000;

/// Guess a filename extension (with leading dot) from a MIME type.
///
/// Returns an empty string for unknown types; derived asset names then simply
/// have no extension, which every backend accepts.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    // Parameters like "; charset=utf-8" do not affect the extension.
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/x-icon" => ".ico",
        "text/plain" => ".txt",
        "text/html" => ".html",
        "text/css" => ".css",
        "text/csv" => ".csv",
        "application/json" => ".json",
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/gzip" => ".gz",
        "application/octet-stream" => ".bin",
        "audio/mpeg" => ".mp3",
        "audio/wav" => ".wav",
        "audio/ogg" => ".ogg",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for_content_type("image/jpeg"), ".jpg");
        assert_eq!(extension_for_content_type("image/png"), ".png");
        assert_eq!(extension_for_content_type("application/pdf"), ".pdf");
    }

    #[test]
    fn test_extension_ignores_parameters_and_case() {
        assert_eq!(
            extension_for_content_type("Image/JPEG; charset=binary"),
            ".jpg"
        );
    }

    #[test]
    fn test_extension_for_unknown_type_is_empty() {
        assert_eq!(extension_for_content_type("application/x-who-knows"), "");
    }
}
