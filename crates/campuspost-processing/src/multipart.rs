use campuspost_core::mime::{
    content_type_for_extension, extension_of, kind_for_content_type, OCTET_STREAM,
};
use campuspost_core::{MediaKind, ProcessedMediaItem, UploadScope};
use serde::Serialize;

pub const POST_TYPE_FIELD: &str = "post_type";

/// One file part of the upload request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePart {
    /// `file_<index>`, 0-based
    pub field_name: String,
    pub uri: String,
    pub mime_type: String,
    pub filename: String,
}

/// Transport-neutral description of the multipart upload request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipartBody {
    pub parts: Vec<FilePart>,
    pub post_type: UploadScope,
}

impl MultipartBody {
    /// Non-file fields; `post_type` appears exactly once.
    pub fn text_fields(&self) -> Vec<(&'static str, &'static str)> {
        vec![(POST_TYPE_FIELD, self.post_type.as_str())]
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// One part per item, in order, named `file_<index>`.
pub fn assemble_upload_body(items: &[ProcessedMediaItem], post_type: UploadScope) -> MultipartBody {
    let parts = items
        .iter()
        .enumerate()
        .map(|(index, item)| FilePart {
            field_name: format!("file_{}", index),
            uri: item.uri.clone(),
            mime_type: correct_mime_type(item.kind, item.mime_type.as_deref(), &item.file_name),
            filename: item.file_name.clone(),
        })
        .collect();

    MultipartBody { parts, post_type }
}

/// MIME type to send for an item.
///
/// The supplied type is kept when it agrees with the item kind. Otherwise images default
/// to `image/jpeg`, videos to `video/quicktime` for `.mov` and `video/mp4` for everything
/// else, and documents to the type registered for their extension or
/// `application/octet-stream`.
pub fn correct_mime_type(kind: MediaKind, supplied: Option<&str>, filename: &str) -> String {
    let supplied = supplied.map(str::trim).filter(|s| !s.is_empty());
    let by_extension = extension_of(filename).and_then(|ext| content_type_for_extension(&ext));

    match kind {
        MediaKind::Image => supplied
            .filter(|s| kind_for_content_type(s) == MediaKind::Image)
            .map(str::to_string)
            .or_else(|| {
                by_extension
                    .filter(|ct| kind_for_content_type(ct) == MediaKind::Image)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "image/jpeg".to_string()),
        MediaKind::Video => supplied
            .filter(|s| kind_for_content_type(s) == MediaKind::Video)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if extension_of(filename).as_deref() == Some("mov") {
                    "video/quicktime".to_string()
                } else {
                    "video/mp4".to_string()
                }
            }),
        MediaKind::Document | MediaKind::Unsupported => supplied
            .filter(|s| kind_for_content_type(s) == MediaKind::Document && *s != OCTET_STREAM)
            .or(by_extension.filter(|ct| kind_for_content_type(ct) == MediaKind::Document))
            .unwrap_or(OCTET_STREAM)
            .to_string(),
    }
}
