use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local, Utc};
use regex::Regex;

use super::extract::{extract_from_uri_at, extract_original_from_temp};
use super::sanitize::sanitize_filename_at;
use crate::events::{EventSink, MediaEvent, TracingEventSink};
use crate::mime::extension_for_content_type;
use crate::models::{FilenameCandidates, FilenameSource, MediaKind};

/// Substring marking a backend-generated placeholder rather than a user-chosen name.
pub const TEMP_MARKER: &str = "temp-";

const MAX_MEANINGFUL_URI_NAME_LEN: usize = 50;

/// Device naming schemes worth keeping when nothing better is available.
const MEANINGFUL_URI_PATTERNS: &[&str] = &[
    r"^(?i)IMG_[\d_]+\.[a-z0-9]+$",
    r"^(?i)VID_[\d_]+\.[a-z0-9]+$",
    r"^(?i)(PXL|DSC|DCIM)_[\w]+\.[a-z0-9]+$",
    r"^(?i)Screenshot[\w \-]*\.[a-z0-9]+$",
    r"^[A-Za-z0-9][A-Za-z0-9 _\-().]*\.[A-Za-z0-9]{2,5}$",
];

/// Substrings left in URIs and names by picker and cache tooling.
const PICKER_MARKERS: &[&str] = &[
    "imagepicker",
    "documentpicker",
    "imagemanipulator",
    "rn_image_picker",
    "exponent",
    "expo/",
    "cache",
];

static MEANINGFUL_URI_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MEANINGFUL_URI_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

static UUID_STEM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()
});

type Tier = fn(&dyn FilenameCandidates, DateTime<Utc>) -> Option<String>;

/// Resolution tiers in priority order; the first `Some` wins.
const TIERS: &[(FilenameSource, Tier)] = &[
    (FilenameSource::DeclaredName, declared_name),
    (FilenameSource::DeviceFileName, device_file_name),
    (FilenameSource::OriginalName, original_name),
    (FilenameSource::OriginalFilename, original_filename),
    (FilenameSource::TempExtraction, temp_extraction),
    (FilenameSource::BackendFilename, backend_filename),
    (FilenameSource::Uri, meaningful_uri_name),
];

fn declared_name(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    user_intent(item.declared_name())
}

fn device_file_name(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    user_intent(item.device_file_name())
}

fn original_name(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    user_intent(item.original_name())
}

fn original_filename(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    user_intent(item.original_filename())
}

fn temp_extraction(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    item.backend_filename()
        .filter(|f| f.contains(TEMP_MARKER))
        .and_then(extract_original_from_temp)
        .filter(|s| has_content(s))
}

fn backend_filename(item: &dyn FilenameCandidates, _: DateTime<Utc>) -> Option<String> {
    [
        item.backend_filename(),
        item.temp_filename(),
        item.saved_filename(),
    ]
    .into_iter()
    .find_map(user_intent)
}

fn meaningful_uri_name(item: &dyn FilenameCandidates, now: DateTime<Utc>) -> Option<String> {
    let uri = item.uri().filter(|u| !u.trim().is_empty())?;
    if has_picker_marker(uri) {
        return None;
    }
    let name = extract_from_uri_at(uri, now);
    is_meaningful_uri_name(&name).then_some(name)
}

/// Accept a declared name unless it is blank or a backend placeholder.
fn user_intent(candidate: Option<&str>) -> Option<String> {
    candidate
        .filter(|c| has_content(c) && !c.contains(TEMP_MARKER))
        .map(str::to_string)
}

/// Something other than whitespace and dots, i.e. it survives sanitization.
fn has_content(candidate: &str) -> bool {
    candidate.chars().any(|c| !c.is_whitespace() && c != '.')
}

fn has_picker_marker(s: &str) -> bool {
    let lower = s.to_lowercase();
    PICKER_MARKERS.iter().any(|m| lower.contains(m))
}

fn is_meaningful_uri_name(name: &str) -> bool {
    if name.chars().count() >= MAX_MEANINGFUL_URI_NAME_LEN || name.contains(TEMP_MARKER) {
        return false;
    }

    if has_picker_marker(name) {
        return false;
    }

    if UUID_STEM
        .as_ref()
        .map(|re| re.is_match(name))
        .unwrap_or(false)
    {
        return false;
    }

    MEANINGFUL_URI_REGEXES.iter().any(|re| re.is_match(name))
}

/// `Photo_2024_01_31_09_05_07.jpg`, `Video_....mp4`, `File_....<ext>`
fn smart_fallback(item: &dyn FilenameCandidates, now: DateTime<Local>) -> String {
    let (prefix, extension) = match item.kind() {
        MediaKind::Image => ("Photo", "jpg"),
        MediaKind::Video => ("Video", "mp4"),
        MediaKind::Document | MediaKind::Unsupported => (
            "File",
            item.mime_type()
                .and_then(extension_for_content_type)
                .unwrap_or("bin"),
        ),
    };
    format!("{}_{}.{}", prefix, now.format("%Y_%m_%d_%H_%M_%S"), extension)
}

/// Outcome of filename resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub filename: String,
    pub source: FilenameSource,
}

/// Picks exactly one sanitized filename per media item.
///
/// User-declared fields win over backend fields, backend fields over URI-derived names,
/// and a timestamped name is generated when nothing usable exists. Resolution never
/// fails.
#[derive(Clone)]
pub struct FilenameResolver {
    events: Arc<dyn EventSink>,
}

impl Default for FilenameResolver {
    fn default() -> Self {
        Self::new(Arc::new(TracingEventSink))
    }
}

impl std::fmt::Debug for FilenameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilenameResolver").finish_non_exhaustive()
    }
}

impl FilenameResolver {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self { events }
    }

    pub fn resolve(&self, item: &dyn FilenameCandidates, index: usize) -> String {
        self.resolve_detailed(item, index).filename
    }

    pub fn resolve_detailed(&self, item: &dyn FilenameCandidates, index: usize) -> Resolution {
        self.resolve_at(item, index, Local::now())
    }

    /// Resolution against a fixed clock.
    pub fn resolve_at(
        &self,
        item: &dyn FilenameCandidates,
        index: usize,
        now: DateTime<Local>,
    ) -> Resolution {
        let utc_now = now.with_timezone(&Utc);

        let (source, candidate) = TIERS
            .iter()
            .find_map(|(source, tier)| {
                let found = tier(item, utc_now);
                if found.is_none() && *source == FilenameSource::TempExtraction {
                    self.report_extraction_miss(item, index);
                }
                found.map(|c| (*source, c))
            })
            .unwrap_or_else(|| (FilenameSource::Fallback, smart_fallback(item, now)));

        let filename = sanitize_filename_at(&candidate, utc_now);
        self.events.emit(MediaEvent::FilenameResolved {
            index,
            source,
            filename: filename.clone(),
        });

        Resolution { filename, source }
    }

    fn report_extraction_miss(&self, item: &dyn FilenameCandidates, index: usize) {
        if let Some(candidate) = item.backend_filename().filter(|f| f.contains(TEMP_MARKER)) {
            self.events.emit(MediaEvent::ExtractionMissed {
                index,
                candidate: candidate.to_string(),
            });
        }
    }
}
