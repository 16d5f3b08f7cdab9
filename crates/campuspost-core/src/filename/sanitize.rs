use chrono::{DateTime, Utc};

pub const MAX_FILENAME_LEN: usize = 255;
const MAX_EXTENSION_LEN: usize = 10;
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '#'];

/// `file_<unix millis>`
pub fn fallback_filename(now: DateTime<Utc>) -> String {
    format!("file_{}", now.timestamp_millis())
}

/// Normalize an arbitrary candidate into a filesystem and database safe filename.
///
/// The result is never empty, contains none of `<>:"/\|?*#` or control characters, has no
/// leading dots or underscores, and is at most 255 characters with a short extension kept
/// intact. Applying it twice gives the same result as applying it once.
pub fn sanitize_filename(candidate: &str) -> String {
    sanitize_filename_at(candidate, Utc::now())
}

/// [`sanitize_filename`] with an explicit clock, used only when the input reduces to nothing.
pub fn sanitize_filename_at(candidate: &str, now: DateTime<Utc>) -> String {
    let replaced: String = candidate
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = collapse_underscores(&replaced.split_whitespace().collect::<Vec<_>>().join(" "));
    let trimmed = collapsed
        .trim_start_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_end();

    if trimmed.is_empty() {
        return fallback_filename(now);
    }

    let prefixed = if trimmed.starts_with('_') {
        format!("file{}", trimmed)
    } else {
        trimmed.to_string()
    };

    truncate_preserving_extension(&prefixed)
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !previous_underscore {
                out.push(c);
            }
            previous_underscore = true;
        } else {
            out.push(c);
            previous_underscore = false;
        }
    }
    out
}

fn truncate_preserving_extension(name: &str) -> String {
    let len = name.chars().count();
    if len <= MAX_FILENAME_LEN {
        return name.to_string();
    }

    let extension = name
        .rfind('.')
        .filter(|&dot| dot > 0)
        .map(|dot| &name[dot + 1..])
        .filter(|ext| {
            let ext_len = ext.chars().count();
            ext_len > 0 && ext_len <= MAX_EXTENSION_LEN
        });

    let truncated = match extension {
        Some(ext) => {
            let ext_len = ext.chars().count();
            let base_len = len - ext_len - 1;
            let keep = MAX_FILENAME_LEN - ext_len - 1;
            let base: String = name.chars().take(base_len.min(keep)).collect();
            format!("{}.{}", base.trim_end(), ext)
        }
        None => name.chars().take(MAX_FILENAME_LEN).collect(),
    };

    truncated.trim_end().to_string()
}
