use campuspost_core::mime::extension_of;
use campuspost_core::{
    FilenameCandidates, MediaConfig, MediaKind, RawMediaItem, ValidationError, ValidationResult,
};

/// Per-kind media validator
///
/// Holds the size ceiling and extension allow-list for one media kind.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    kind: MediaKind,
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl MediaValidator {
    pub fn new(kind: MediaKind, max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            kind,
            max_file_size,
            allowed_extensions,
        }
    }

    /// Validator for `kind` under `config`, `None` for unsupported kinds.
    ///
    /// Videos are capped at the video limit; images and documents only by the
    /// aggregate limit.
    pub fn for_kind(kind: MediaKind, config: &MediaConfig) -> Option<Self> {
        let (max, allowed) = match kind {
            MediaKind::Image => (
                config.max_total_size_bytes,
                &config.image_allowed_extensions,
            ),
            MediaKind::Video => (
                config.max_video_size_bytes,
                &config.video_allowed_extensions,
            ),
            MediaKind::Document => (
                config.max_total_size_bytes,
                &config.document_allowed_extensions,
            ),
            MediaKind::Unsupported => return None,
        };
        Some(Self::new(kind, max, allowed.clone()))
    }

    /// Validate file size. Unknown sizes pass.
    pub fn validate_file_size(&self, size: Option<u64>) -> Result<(), ValidationError> {
        let Some(size) = size else {
            return Ok(());
        };

        if size > self.max_file_size {
            return Err(match self.kind {
                MediaKind::Video => ValidationError::VideoTooLarge {
                    size,
                    max: self.max_file_size,
                },
                _ => ValidationError::FileTooLarge {
                    size,
                    max: self.max_file_size,
                },
            });
        }

        Ok(())
    }

    /// Validate file extension. Names without an extension pass; picker URIs often
    /// lack one.
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let Some(extension) = extension_of(filename) else {
            return Ok(());
        };

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                kind: self.kind.as_str().to_string(),
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }
}

/// Validate a picker batch before anything touches the network.
///
/// Checks, in order: item count, then per item URI, kind, extension and size, then the
/// aggregate size. The first failure wins.
pub fn validate_batch(items: &[RawMediaItem], config: &MediaConfig) -> Result<(), ValidationError> {
    if items.len() > config.max_files {
        return Err(ValidationError::TooManyFiles {
            count: items.len(),
            max: config.max_files,
        });
    }

    let mut total: u64 = 0;
    for (index, item) in items.iter().enumerate() {
        if item.uri.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(ValidationError::MissingUri { index });
        }

        let validator = MediaValidator::for_kind(item.kind, config)
            .ok_or(ValidationError::UnsupportedType { index })?;

        if let Some(name) = extension_source(item) {
            validator.validate_extension(name)?;
        }
        validator.validate_file_size(item.size)?;

        total = total.saturating_add(item.size.unwrap_or(0));
    }

    if total > config.max_total_size_bytes {
        return Err(ValidationError::TotalTooLarge {
            total,
            max: config.max_total_size_bytes,
        });
    }

    Ok(())
}

/// [`validate_batch`] as a `{isValid, error}` result.
pub fn validate_media(items: &[RawMediaItem], config: &MediaConfig) -> ValidationResult {
    ValidationResult::from(&validate_batch(items, config))
}

/// First candidate name carrying an extension.
fn extension_source(item: &RawMediaItem) -> Option<&str> {
    let uri_segment = item
        .uri()
        .map(|u| u.split(['?', '#']).next().unwrap_or(u))
        .and_then(|u| u.rsplit('/').next());

    [
        item.declared_name(),
        item.device_file_name(),
        item.original_name(),
        item.original_filename(),
        uri_segment,
    ]
    .into_iter()
    .flatten()
    .find(|name| extension_of(name).is_some())
}
