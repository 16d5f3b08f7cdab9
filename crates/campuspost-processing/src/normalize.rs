//! Media normalization in both directions.
//!
//! Outbound: picker items become upload-ready items with a resolved filename, recompressed
//! when large. Inbound: upload-response items (or raw items on the single-step path)
//! become post-payload media with a storage URL that ends with the filename.

use std::sync::Arc;

use campuspost_core::mime::is_pdf;
use campuspost_core::{
    EventSink, FilenameResolver, MediaBatch, MediaConfig, MediaEvent, MediaKind, PostMediaItem,
    PostMediaType, ProcessedMediaItem, RawMediaItem, UploadResponseMediaItem, ValidationError,
};

use crate::compression::{compress_with_policy, needs_compression, ImageCompressor};
use crate::staging::StagedFiles;

pub struct MediaNormalizer {
    config: MediaConfig,
    resolver: FilenameResolver,
    compressor: Option<Arc<dyn ImageCompressor>>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for MediaNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaNormalizer")
            .field("config", &self.config)
            .field("compression", &self.compressor.is_some())
            .finish_non_exhaustive()
    }
}

impl MediaNormalizer {
    pub fn new(config: MediaConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            resolver: FilenameResolver::new(events.clone()),
            compressor: None,
            events,
        }
    }

    /// Enable recompression of large images.
    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn resolver(&self) -> &FilenameResolver {
        &self.resolver
    }

    /// Prepare one picker item for upload.
    ///
    /// Images at or above the compression threshold are recompressed (falling back to the
    /// original on any compressor error). Videos over the video limit are rejected.
    /// Documents pass through. Compressor output files are left for the caller; use
    /// [`Self::normalize_for_upload_tracked`] to have them registered for cleanup.
    pub async fn normalize_for_upload(
        &self,
        raw: &RawMediaItem,
        index: usize,
    ) -> Result<ProcessedMediaItem, ValidationError> {
        self.prepare(raw, index, None).await
    }

    /// [`Self::normalize_for_upload`], recording every compressor output in `staged`.
    pub async fn normalize_for_upload_tracked(
        &self,
        raw: &RawMediaItem,
        index: usize,
        staged: &StagedFiles,
    ) -> Result<ProcessedMediaItem, ValidationError> {
        self.prepare(raw, index, Some(staged)).await
    }

    async fn prepare(
        &self,
        raw: &RawMediaItem,
        index: usize,
        staged: Option<&StagedFiles>,
    ) -> Result<ProcessedMediaItem, ValidationError> {
        let uri = raw
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingUri { index })?;

        let resolution = self.resolver.resolve_detailed(raw, index);

        let mut processed = ProcessedMediaItem {
            uri: uri.to_string(),
            kind: raw.kind,
            name: resolution.filename.clone(),
            file_name: resolution.filename.clone(),
            original_user_filename: resolution.filename,
            filename_source: resolution.source,
            size: raw.size,
            mime_type: raw.mime_type.clone(),
            original_name: raw.original_name.clone(),
            original_filename: raw.original_filename.clone(),
            compressed: false,
        };

        match raw.kind {
            MediaKind::Image => self.compress_image(&mut processed, index, staged).await,
            MediaKind::Video => {
                if let Some(size) = raw.size {
                    if size > self.config.max_video_size_bytes {
                        return Err(ValidationError::VideoTooLarge {
                            size,
                            max: self.config.max_video_size_bytes,
                        });
                    }
                }
            }
            MediaKind::Document => {}
            MediaKind::Unsupported => return Err(ValidationError::UnsupportedType { index }),
        }

        tracing::debug!(
            index = index,
            kind = %processed.kind,
            filename = %processed.file_name,
            source = processed.filename_source.as_str(),
            compressed = processed.compressed,
            "Media item normalized for upload"
        );

        Ok(processed)
    }

    async fn compress_image(
        &self,
        processed: &mut ProcessedMediaItem,
        index: usize,
        staged: Option<&StagedFiles>,
    ) {
        let policy = &self.config.compression;
        let (Some(compressor), Some(size)) = (&self.compressor, processed.size) else {
            return;
        };
        if !needs_compression(Some(size), policy) {
            return;
        }

        let run = compress_with_policy(
            compressor.as_ref(),
            &processed.uri,
            size,
            index,
            policy,
            self.events.as_ref(),
        )
        .await;

        if let Some(staged) = staged {
            for uri in &run.outputs {
                staged.track(uri.clone());
            }
        }

        if let Some(selected) = run.selected {
            tracing::info!(
                index = index,
                original_size = size,
                compressed_size = selected.estimated_size,
                "Image compressed"
            );
            processed.uri = selected.uri;
            processed.size = Some(selected.estimated_size);
            processed.mime_type = Some("image/jpeg".to_string());
            processed.compressed = true;
        }
    }

    /// Post-payload media for an upload-response item (two-step path).
    ///
    /// The filename is re-derived as `temp-<author_id>-<resolved name>` and the URL is
    /// rebuilt from the storage base, never taken from the response.
    pub fn normalize_for_post(
        &self,
        uploaded: &UploadResponseMediaItem,
        index: usize,
        author_id: i64,
    ) -> PostMediaItem {
        let resolved = self.resolver.resolve(uploaded, index);
        let filename = format!("temp-{}-{}", author_id, resolved);

        let item = PostMediaItem {
            media_type: PostMediaType::from(uploaded.kind),
            url: self.storage_url(uploaded.kind, &filename),
            filename,
            size: uploaded.size.unwrap_or(0),
            sort_order: sort_order(index),
        };
        self.check_consistency(&item, index);
        item
    }

    /// Post-payload media straight from a picker item (single-step path).
    pub fn normalize_raw_for_post(&self, raw: &RawMediaItem, index: usize) -> PostMediaItem {
        let filename = self.resolver.resolve(raw, index);

        let item = PostMediaItem {
            media_type: post_media_type(raw.kind, &filename, raw.mime_type.as_deref()),
            url: self.storage_url(raw.kind, &filename),
            filename,
            size: raw.size.unwrap_or(0),
            sort_order: sort_order(index),
        };
        self.check_consistency(&item, index);
        item
    }

    /// Post-payload media for an item exactly as it was uploaded (single-step path).
    ///
    /// Filename, size and kind come from the upload; the resolver is not consulted again.
    pub fn normalize_processed_for_post(
        &self,
        sent: &ProcessedMediaItem,
        index: usize,
    ) -> PostMediaItem {
        let item = PostMediaItem {
            media_type: post_media_type(sent.kind, &sent.file_name, sent.mime_type.as_deref()),
            url: self.storage_url(sent.kind, &sent.file_name),
            filename: sent.file_name.clone(),
            size: sent.size.unwrap_or(0),
            sort_order: sort_order(index),
        };
        self.check_consistency(&item, index);
        item
    }

    /// Post-payload media after an upload of `sent`.
    ///
    /// When the response names its files, each returned item goes through the two-step
    /// path, taking `type` and `size` from the item sent at the same position if the
    /// backend left them out. Otherwise the sent items are used as they were uploaded.
    pub fn build_uploaded_post_media(
        &self,
        returned: Vec<UploadResponseMediaItem>,
        sent: &[ProcessedMediaItem],
        author_id: i64,
    ) -> Vec<PostMediaItem> {
        if !returned.first().is_some_and(|item| item.filename.is_some()) {
            return sent
                .iter()
                .enumerate()
                .map(|(index, item)| self.normalize_processed_for_post(item, index))
                .collect();
        }

        returned
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                if let Some(sent) = sent.get(index) {
                    if item.kind == MediaKind::Unsupported {
                        item.kind = sent.kind;
                    }
                    item.size = item.size.or(sent.size);
                }
                self.normalize_for_post(&item, index, author_id)
            })
            .collect()
    }

    /// Post-payload media for a whole batch, in input order.
    pub fn build_post_media(&self, batch: &MediaBatch, author_id: i64) -> Vec<PostMediaItem> {
        match batch {
            MediaBatch::Uploaded(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.normalize_for_post(item, index, author_id))
                .collect(),
            MediaBatch::Raw(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.normalize_raw_for_post(item, index))
                .collect(),
        }
    }

    /// `{base}/{images|videos|documents}/{filename}`
    pub fn storage_url(&self, kind: MediaKind, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.storage_base_url.trim_end_matches('/'),
            kind.storage_dir(),
            filename
        )
    }

    /// Report items whose URL does not end with their filename. Returns whether the item
    /// is consistent.
    pub fn check_consistency(&self, item: &PostMediaItem, index: usize) -> bool {
        if item.is_consistent() {
            return true;
        }

        tracing::warn!(
            index = index,
            url = %item.url,
            filename = %item.filename,
            "Media URL does not end with its filename"
        );
        self.events.emit(MediaEvent::ConsistencyViolated {
            index,
            url: item.url.clone(),
            filename: item.filename.clone(),
        });
        false
    }
}

fn post_media_type(kind: MediaKind, filename: &str, mime_type: Option<&str>) -> PostMediaType {
    match kind {
        MediaKind::Document if is_pdf(Some(filename), mime_type) => PostMediaType::Pdf,
        kind => PostMediaType::from(kind),
    }
}

fn sort_order(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1))
}
