//! Traits for the network side of the post pipeline.

use async_trait::async_trait;
use campuspost_core::{CreatePostRequest, PipelineError, UploadResponse, UploadScope};
use serde_json::Value as JsonValue;

use crate::multipart::MultipartBody;

/// Upload and post-creation endpoints. Implemented by the API client.
///
/// Timeouts belong to the implementation; the pipeline never retries.
#[async_trait]
pub trait PostTransport: Send + Sync {
    async fn upload_media(&self, body: &MultipartBody) -> Result<UploadResponse, PipelineError>;

    async fn create_post(
        &self,
        scope: UploadScope,
        request: &CreatePostRequest,
    ) -> Result<JsonValue, PipelineError>;
}
