//! Post publishing pipeline: validate → normalize → upload → reconcile → create.
//!
//! Validation runs before any network call; a rejected batch never reaches the upload
//! endpoint. Items are processed one at a time so progress counters stay accurate.
//! Cache files written during a run are tracked per run and removed on every exit path,
//! so concurrent publishes on one pipeline never delete each other's files.

use std::sync::Arc;

use campuspost_core::{
    CreatePostRequest, EventSink, MediaConfig, MediaEvent, PipelineError,
    PostCategory, ProcessedMediaItem, RawMediaItem, UploadResponseMediaItem, UploadScope,
    ValidationError, ValidationResult,
};
use serde_json::Value as JsonValue;

use crate::compression::ImageCompressor;
use crate::multipart::assemble_upload_body;
use crate::normalize::MediaNormalizer;
use crate::staging::StagedFiles;
use crate::transport::PostTransport;
use crate::validator::validate_batch;

/// Everything needed to publish one post
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub author_id: i64,
    pub scope: UploadScope,
    pub class_id: Option<String>,
    pub grade: Option<String>,
    pub media: Vec<RawMediaItem>,
}

impl PostDraft {
    /// Class posts need a class; every post needs a title.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.title.trim().is_empty() {
            return Err(PipelineError::InvalidInput("Post title is required".to_string()));
        }
        if self.scope == UploadScope::ClassPosts
            && self.class_id.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(PipelineError::InvalidInput(
                "Class posts require a class_id".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Processing,
    Uploading,
    Creating,
}

/// `current` is 1-based while processing; upload and creation report `total/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub stage: ProgressStage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub request: CreatePostRequest,
    pub response: JsonValue,
}

/// Raise `UploadIncomplete` when the endpoint returned a different number of items than
/// were sent, or any item without a usable URL.
pub fn check_upload_complete(
    expected: usize,
    returned: &[UploadResponseMediaItem],
) -> Result<(), PipelineError> {
    let missing_urls = returned
        .iter()
        .filter(|item| item.usable_url().is_none())
        .count();

    if returned.len() != expected || missing_urls > 0 {
        return Err(PipelineError::UploadIncomplete {
            expected,
            received: returned.len(),
            missing_urls,
        });
    }

    Ok(())
}

pub struct PostPipeline {
    normalizer: MediaNormalizer,
    transport: Arc<dyn PostTransport>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PostPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostPipeline")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl PostPipeline {
    pub fn new(
        config: MediaConfig,
        transport: Arc<dyn PostTransport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            normalizer: MediaNormalizer::new(config, events.clone()),
            transport,
            events,
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.normalizer = self.normalizer.with_compressor(compressor);
        self
    }

    pub fn normalizer(&self) -> &MediaNormalizer {
        &self.normalizer
    }

    /// Structured validation outcome for a picker batch.
    pub fn validate(&self, media: &[RawMediaItem]) -> ValidationResult {
        let result = validate_batch(media, self.normalizer.config());
        if let Err(e) = &result {
            self.report_validation_failure(e);
        }
        ValidationResult::from(&result)
    }

    pub async fn publish(&self, draft: &PostDraft) -> Result<PublishOutcome, PipelineError> {
        self.publish_with_progress(draft, |_| {}).await
    }

    pub async fn publish_with_progress<F>(
        &self,
        draft: &PostDraft,
        on_progress: F,
    ) -> Result<PublishOutcome, PipelineError>
    where
        F: FnMut(Progress) + Send,
    {
        tracing::info!(
            author_id = draft.author_id,
            scope = %draft.scope,
            media_count = draft.media.len(),
            "Publishing post"
        );

        let staged = StagedFiles::new(self.events.clone());
        let result = self.run(draft, &staged, on_progress).await;

        let removed = staged.cleanup().await;
        if removed > 0 {
            tracing::debug!(removed = removed, "Staged files cleaned up");
        }

        match &result {
            Ok(_) => tracing::info!(author_id = draft.author_id, "Post published"),
            Err(e) => tracing::warn!(author_id = draft.author_id, error = %e, "Post publishing failed"),
        }
        result
    }

    async fn run<F>(
        &self,
        draft: &PostDraft,
        staged: &StagedFiles,
        mut on_progress: F,
    ) -> Result<PublishOutcome, PipelineError>
    where
        F: FnMut(Progress) + Send,
    {
        draft.validate()?;

        if let Err(e) = validate_batch(&draft.media, self.normalizer.config()) {
            self.report_validation_failure(&e);
            return Err(e.into());
        }

        let media = if draft.media.is_empty() {
            Vec::new()
        } else {
            let total = draft.media.len();
            let mut processed: Vec<ProcessedMediaItem> = Vec::with_capacity(total);
            for (index, raw) in draft.media.iter().enumerate() {
                on_progress(Progress {
                    current: index + 1,
                    total,
                    stage: ProgressStage::Processing,
                });
                let item = self
                    .normalizer
                    .normalize_for_upload_tracked(raw, index, staged)
                    .await
                    .inspect_err(|e| self.report_validation_failure(e))?;
                processed.push(item);
            }

            on_progress(Progress {
                current: total,
                total,
                stage: ProgressStage::Uploading,
            });
            let body = assemble_upload_body(&processed, draft.scope);
            let response = self.transport.upload_media(&body).await?;

            if !response.is_success() {
                return Err(PipelineError::network(
                    None,
                    response.message().map(str::to_string),
                ));
            }

            let returned = response.media_items().ok_or_else(|| {
                PipelineError::InvalidResponse("Upload response contains no media list".to_string())
            })?;
            tracing::debug!(
                key = response.media_key().unwrap_or_default(),
                count = returned.len(),
                "Upload response parsed"
            );

            if let Err(e) = check_upload_complete(processed.len(), &returned) {
                if let PipelineError::UploadIncomplete {
                    expected,
                    received,
                    missing_urls,
                } = &e
                {
                    self.events.emit(MediaEvent::UploadIncomplete {
                        expected: *expected,
                        received: *received,
                        missing_urls: *missing_urls,
                    });
                }
                return Err(e);
            }

            self.normalizer
                .build_uploaded_post_media(returned, &processed, draft.author_id)
        };

        let request = CreatePostRequest::new(
            draft.category,
            draft.title.trim(),
            draft.content.as_str(),
            draft.author_id,
            media,
        )
        .with_class_id(draft.class_id.clone())
        .with_grade(draft.grade.clone());

        let total = draft.media.len();
        on_progress(Progress {
            current: total,
            total,
            stage: ProgressStage::Creating,
        });
        let response = self.transport.create_post(draft.scope, &request).await?;

        Ok(PublishOutcome { request, response })
    }

    fn report_validation_failure(&self, error: &ValidationError) {
        tracing::warn!(reason = error.reason(), error = %error, "Media validation failed");
        self.events.emit(MediaEvent::ValidationFailed {
            reason: error.reason(),
            message: error.to_string(),
        });
    }
}
