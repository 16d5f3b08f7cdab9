use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Media type as reported by the device picker or the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    /// Anything the picker or backend reports that we do not handle
    #[serde(other)]
    Unsupported,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Unsupported => "unsupported",
        }
    }

    /// Storage subdirectory used when reconstructing media URLs.
    pub fn storage_dir(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Document | MediaKind::Unsupported => "documents",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which candidate field a resolved filename came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameSource {
    DeclaredName,
    DeviceFileName,
    OriginalName,
    OriginalFilename,
    TempExtraction,
    BackendFilename,
    Uri,
    Fallback,
}

impl FilenameSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FilenameSource::DeclaredName => "declared_name",
            FilenameSource::DeviceFileName => "device_file_name",
            FilenameSource::OriginalName => "original_name",
            FilenameSource::OriginalFilename => "original_filename",
            FilenameSource::TempExtraction => "temp_extraction",
            FilenameSource::BackendFilename => "backend_filename",
            FilenameSource::Uri => "uri",
            FilenameSource::Fallback => "fallback",
        }
    }
}

/// Read access to every field the filename resolver may consider.
///
/// Implemented by both the picker-side [`RawMediaItem`] and the backend-side
/// [`UploadResponseMediaItem`] so one resolver serves both passes.
pub trait FilenameCandidates {
    fn kind(&self) -> MediaKind;

    fn declared_name(&self) -> Option<&str> {
        None
    }

    fn device_file_name(&self) -> Option<&str> {
        None
    }

    fn original_name(&self) -> Option<&str> {
        None
    }

    fn original_filename(&self) -> Option<&str> {
        None
    }

    fn backend_filename(&self) -> Option<&str> {
        None
    }

    fn temp_filename(&self) -> Option<&str> {
        None
    }

    fn saved_filename(&self) -> Option<&str> {
        None
    }

    fn uri(&self) -> Option<&str> {
        None
    }

    fn mime_type(&self) -> Option<&str> {
        None
    }
}

/// Media descriptor produced by the device picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMediaItem {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl RawMediaItem {
    pub fn new(uri: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            uri: Some(uri.into()),
            kind,
            name: None,
            file_name: None,
            original_name: None,
            original_filename: None,
            size: None,
            mime_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl FilenameCandidates for RawMediaItem {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn device_file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// Upload-ready media descriptor.
///
/// `name` and `file_name` always carry the same sanitized filename; the duplicate keeps
/// older consumers that read `fileName` working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedMediaItem {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub name: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub original_user_filename: String,
    #[serde(rename = "filenameSource")]
    pub filename_source: FilenameSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    /// Set when `uri`/`size` point at a recompressed copy
    #[serde(default)]
    pub compressed: bool,
}

/// Media descriptor returned by the upload endpoint. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponseMediaItem {
    #[serde(rename = "type", default = "unsupported_kind")]
    pub kind: MediaKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Backends send numbers, floats or numeric strings; anything else reads as unknown
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_filename: Option<String>,
    #[serde(
        rename = "mimeType",
        alias = "mime_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    /// Remaining backend fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

fn unsupported_kind() -> MediaKind {
    MediaKind::Unsupported
}

fn lenient_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(size_from_json))
}

fn size_from_json(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_bytes)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_bytes))
        }
        _ => None,
    }
}

fn whole_bytes(size: f64) -> Option<u64> {
    (size.is_finite() && size >= 0.0 && size <= u64::MAX as f64).then(|| size.round() as u64)
}

impl UploadResponseMediaItem {
    pub fn new(kind: MediaKind, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            kind,
            url: Some(url.into()),
            filename: Some(filename.into()),
            size: None,
            original_filename: None,
            thumbnail_url: None,
            name: None,
            file_name: None,
            original_name: None,
            temp_filename: None,
            saved_filename: None,
            mime_type: None,
            extra: Map::new(),
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// URL if present and not blank.
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

impl FilenameCandidates for UploadResponseMediaItem {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn device_file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    fn backend_filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    fn temp_filename(&self) -> Option<&str> {
        self.temp_filename.as_deref()
    }

    fn saved_filename(&self) -> Option<&str> {
        self.saved_filename.as_deref()
    }

    fn uri(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// Media type token sent in the post-creation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMediaType {
    Image,
    Video,
    Document,
    Pdf,
}

impl From<MediaKind> for PostMediaType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => PostMediaType::Image,
            MediaKind::Video => PostMediaType::Video,
            MediaKind::Document | MediaKind::Unsupported => PostMediaType::Document,
        }
    }
}

/// Final media element of a post-creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMediaItem {
    #[serde(rename = "type")]
    pub media_type: PostMediaType,
    pub url: String,
    pub filename: String,
    pub size: u64,
    /// 1-based position within the post
    pub sort_order: u32,
}

impl PostMediaItem {
    /// Media rendering requires the URL to end with the filename.
    pub fn is_consistent(&self) -> bool {
        !self.filename.is_empty() && self.url.ends_with(&self.filename)
    }
}
