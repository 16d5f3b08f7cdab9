//! Extension ⇄ content-type table shared by MIME correction, PDF detection and the
//! resolver's fallback extension inference.

use std::path::Path;

use crate::models::MediaKind;

const CONTENT_TYPES: &[(&str, &str)] = &[
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("bmp", "image/bmp"),
    // Videos
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("3gp", "video/3gpp"),
    // Documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("zip", "application/zip"),
];

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercased extension of a filename, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.to_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, ct)| *ct)
}

/// First registered extension for a content type (`image/jpeg` → `jpg`).
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let normalized = normalize(content_type);
    CONTENT_TYPES
        .iter()
        .find(|(_, ct)| *ct == normalized)
        .map(|(ext, _)| *ext)
}

/// Media kind a content type belongs to, judged by its top-level type.
pub fn kind_for_content_type(content_type: &str) -> MediaKind {
    let normalized = normalize(content_type);
    if normalized.starts_with("image/") {
        MediaKind::Image
    } else if normalized.starts_with("video/") {
        MediaKind::Video
    } else {
        MediaKind::Document
    }
}

/// Whether a filename or content type designates a PDF.
pub fn is_pdf(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_mime = content_type
        .map(|ct| normalize(ct) == "application/pdf")
        .unwrap_or(false);
    let by_name = filename
        .and_then(extension_of)
        .map(|ext| ext == "pdf")
        .unwrap_or(false);
    by_mime || by_name
}

/// Strip parameters (`; charset=...`) and lowercase.
fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        assert_eq!(content_type_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for_extension("mov"), Some("video/quicktime"));
        assert_eq!(content_type_for_extension("xyz"), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(
            extension_for_content_type("application/pdf; charset=binary"),
            Some("pdf")
        );
        assert_eq!(extension_for_content_type("application/x-unknown"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("noextension"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Some("notes.pdf"), None));
        assert!(is_pdf(None, Some("Application/PDF")));
        assert!(!is_pdf(Some("notes.docx"), Some("application/msword")));
        assert!(!is_pdf(None, None));
    }

    #[test]
    fn test_kind_for_content_type() {
        assert_eq!(kind_for_content_type("image/png"), MediaKind::Image);
        assert_eq!(kind_for_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(kind_for_content_type("text/plain"), MediaKind::Document);
    }
}
