use std::path::Path;

use anyhow::Context;
use campuspost_core::mime::{content_type_for_extension, extension_of, kind_for_content_type};
use campuspost_core::{
    FilenameCandidates, FilenameResolver, FilenameSource, MediaBatch, MediaKind, RawMediaItem,
};
use campuspost_processing::path_to_uri;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Picker-style media item for a local file: kind and MIME type from the extension,
/// size from the filesystem.
pub fn media_item_from_path(path: &Path) -> anyhow::Result<RawMediaItem> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    let mime_type = name
        .as_deref()
        .and_then(extension_of)
        .and_then(|ext| content_type_for_extension(&ext));
    let kind = mime_type
        .map(kind_for_content_type)
        .unwrap_or(MediaKind::Unsupported);

    let mut item = RawMediaItem::new(path_to_uri(&absolute), kind).with_size(metadata.len());
    item.name = name;
    item.mime_type = mime_type.map(str::to_string);
    Ok(item)
}

#[derive(Debug, Serialize)]
pub struct ResolvedName {
    pub index: usize,
    pub filename: String,
    pub source: FilenameSource,
}

/// Resolve one filename per item of a JSON media object or array.
pub fn resolve_json(input: &str, resolver: &FilenameResolver) -> anyhow::Result<Vec<ResolvedName>> {
    let value: JsonValue = serde_json::from_str(input).context("Input is not valid JSON")?;
    let values = match value {
        JsonValue::Array(values) => values,
        other => vec![other],
    };

    let batch = MediaBatch::detect(values)?;
    let items: Vec<&dyn FilenameCandidates> = match &batch {
        MediaBatch::Raw(items) => items.iter().map(|i| i as &dyn FilenameCandidates).collect(),
        MediaBatch::Uploaded(items) => {
            items.iter().map(|i| i as &dyn FilenameCandidates).collect()
        }
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let resolution = resolver.resolve_detailed(item, index);
            ResolvedName {
                index,
                filename: resolution.filename,
                source: resolution.source,
            }
        })
        .collect())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use campuspost_core::NoOpEventSink;
    use std::sync::Arc;

    fn resolver() -> FilenameResolver {
        FilenameResolver::new(Arc::new(NoOpEventSink))
    }

    #[test]
    fn test_media_item_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Field Trip.MOV");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let item = media_item_from_path(&path).unwrap();
        assert_eq!(item.kind, MediaKind::Video);
        assert_eq!(item.name.as_deref(), Some("Field Trip.MOV"));
        assert_eq!(item.mime_type.as_deref(), Some("video/quicktime"));
        assert_eq!(item.size, Some(64));
        assert!(item.uri.unwrap().starts_with("file://"));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.xyz");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(media_item_from_path(&path).unwrap().kind, MediaKind::Unsupported);
    }

    #[test]
    fn test_missing_file() {
        assert!(media_item_from_path(Path::new("/definitely/not/here.jpg")).is_err());
    }

    #[test]
    fn test_resolve_json_array() {
        let out = resolve_json(
            r#"[{"uri":"file:///a","type":"image","name":"UserSelected.jpg","fileName":"temp-generated-123.jpg"},
               {"uri":"file:///b","type":"video","fileName":"Clip.mp4"}]"#,
            &resolver(),
        )
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].filename, "UserSelected.jpg");
        assert_eq!(out[0].source, FilenameSource::DeclaredName);
        assert_eq!(out[1].filename, "Clip.mp4");
        assert_eq!(out[1].index, 1);
    }

    #[test]
    fn test_resolve_json_uploaded_object() {
        let out = resolve_json(
            r#"{"url":"https://cdn.example.org/x","type":"image","filename":"temp-1640995200000-My_Photo.jpg"}"#,
            &resolver(),
        )
        .unwrap();

        assert_eq!(out[0].filename, "My_Photo.jpg");
        assert_eq!(out[0].source, FilenameSource::TempExtraction);
    }

    #[test]
    fn test_resolve_json_rejects_mixed_batch() {
        let err = resolve_json(
            r#"[{"uri":"file:///a","type":"image"},{"url":"https://x/b","type":"image"}]"#,
            &resolver(),
        );
        assert!(err.is_err());
    }
}
