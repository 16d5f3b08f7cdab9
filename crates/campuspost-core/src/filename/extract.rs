use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use regex::Regex;

use super::sanitize::{fallback_filename, sanitize_filename_at};

/// Backend temp-name shapes, most specific first. Capture 1 is the original name.
const TEMP_PATTERNS: &[&str] = &[
    r"^temp-\d+-(.+)$",
    r"^temp_\d+_(.+)$",
    r"^\d+-(.+)$",
    r"^backend-(.+)$",
];

static TEMP_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TEMP_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Filename from the last path segment of a URI.
///
/// Lowest-priority source: device URIs usually carry cache or picker names rather
/// than anything the user chose. A blank URI yields `file_<timestamp>`.
pub fn extract_from_uri(uri: &str) -> String {
    extract_from_uri_at(uri, Utc::now())
}

pub fn extract_from_uri_at(uri: &str, now: DateTime<Utc>) -> String {
    let uri = uri.trim();
    if uri.is_empty() {
        return fallback_filename(now);
    }

    let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
    let segment = without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query);
    let decoded = percent_decode_str(segment).decode_utf8_lossy();

    sanitize_filename_at(&decoded, now)
}

/// Original name embedded in a backend temp name such as `temp-1640995200000-My_Photo.jpg`.
///
/// Returns `None` for blank input or when no known shape matches.
pub fn extract_original_from_temp(temp_name: &str) -> Option<String> {
    let temp_name = temp_name.trim();
    if temp_name.is_empty() {
        return None;
    }

    TEMP_REGEXES.iter().find_map(|re| {
        re.captures(temp_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_temp_primary_pattern() {
        assert_eq!(
            extract_original_from_temp("temp-1640995200000-My_Photo.jpg").as_deref(),
            Some("My_Photo.jpg")
        );
    }

    #[test]
    fn test_temp_name_with_dashes_keeps_rest() {
        assert_eq!(
            extract_original_from_temp("temp-1-my-holiday-photo.jpg").as_deref(),
            Some("my-holiday-photo.jpg")
        );
    }

    #[test]
    fn test_temp_fallback_patterns() {
        assert_eq!(
            extract_original_from_temp("temp_1640995200000_Report.pdf").as_deref(),
            Some("Report.pdf")
        );
        assert_eq!(
            extract_original_from_temp("1640995200000-clip.mp4").as_deref(),
            Some("clip.mp4")
        );
        assert_eq!(
            extract_original_from_temp("backend-scan.png").as_deref(),
            Some("scan.png")
        );
    }

    #[test]
    fn test_temp_no_match() {
        assert_eq!(extract_original_from_temp("not-a-temp-name.jpg"), None);
        assert_eq!(extract_original_from_temp("temp-backend-789.png"), None);
        assert_eq!(extract_original_from_temp(""), None);
        assert_eq!(extract_original_from_temp("   "), None);
    }

    #[test]
    fn test_uri_last_segment() {
        assert_eq!(
            extract_from_uri_at("file:///data/user/0/cache/IMG_20240101.jpg", fixed_now()),
            "IMG_20240101.jpg"
        );
        assert_eq!(
            extract_from_uri_at("https://cdn.example.org/a/b/c.png?token=abc#frag", fixed_now()),
            "c.png"
        );
    }

    #[test]
    fn test_uri_segment_is_decoded_and_sanitized() {
        assert_eq!(
            extract_from_uri_at("file:///tmp/My%20Photo%3F.jpg", fixed_now()),
            "My Photo_.jpg"
        );
    }

    #[test]
    fn test_blank_uri_falls_back() {
        assert_eq!(extract_from_uri_at("", fixed_now()), "file_1700000000000");
        assert_eq!(
            extract_from_uri_at("file:///tmp/dir/", fixed_now()),
            "file_1700000000000"
        );
    }
}
