//! Test helpers: in-memory transport and compressor for pipeline tests.
//!
//! Run from workspace root: `cargo test -p campuspost-processing --test pipeline_test`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campuspost_core::{
    CreatePostRequest, MediaConfig, PipelineError, RecordingEventSink, UploadResponse, UploadScope,
};
use campuspost_processing::{
    path_to_uri, uri_to_path, CompressedImage, ImageCompressor, MultipartBody, PostPipeline,
    PostTransport,
};
use serde_json::{json, Value as JsonValue};
use tokio::sync::Notify;

/// Backend timestamp used in echoed temp names.
pub const BACKEND_TIMESTAMP: u64 = 1_640_995_200_000;

enum UploadBehavior {
    /// Echo every part back as `temp-<timestamp>-<filename>` under `data`
    Echo,
    /// Return this body verbatim
    Fixed(JsonValue),
    /// Fail with this status and backend message
    Fail(u16, Option<String>),
}

pub struct FakeTransport {
    upload: UploadBehavior,
    uploads: Mutex<Vec<MultipartBody>>,
    posts: Mutex<Vec<(UploadScope, CreatePostRequest)>>,
}

impl FakeTransport {
    pub fn echo() -> Arc<Self> {
        Arc::new(Self::with(UploadBehavior::Echo))
    }

    pub fn responding(body: JsonValue) -> Arc<Self> {
        Arc::new(Self::with(UploadBehavior::Fixed(body)))
    }

    pub fn failing(status: u16, message: Option<&str>) -> Arc<Self> {
        Arc::new(Self::with(UploadBehavior::Fail(
            status,
            message.map(str::to_string),
        )))
    }

    fn with(upload: UploadBehavior) -> Self {
        Self {
            upload,
            uploads: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<MultipartBody> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(UploadScope, CreatePostRequest)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.uploads.lock().unwrap().len() + self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl PostTransport for FakeTransport {
    async fn upload_media(&self, body: &MultipartBody) -> Result<UploadResponse, PipelineError> {
        self.uploads.lock().unwrap().push(body.clone());

        match &self.upload {
            UploadBehavior::Echo => {
                let data: Vec<JsonValue> = body
                    .parts
                    .iter()
                    .map(|part| {
                        let temp = format!("temp-{}-{}", BACKEND_TIMESTAMP, part.filename);
                        json!({
                            "filename": temp,
                            "url": format!("https://cdn.example.org/uploads/{}", temp),
                            "type": kind_for_mime(&part.mime_type),
                            "size": 1024,
                            "mimeType": part.mime_type,
                        })
                    })
                    .collect();
                Ok(UploadResponse::new(json!({"success": true, "data": data})))
            }
            UploadBehavior::Fixed(body) => Ok(UploadResponse::new(body.clone())),
            UploadBehavior::Fail(status, message) => {
                Err(PipelineError::network(Some(*status), message.clone()))
            }
        }
    }

    async fn create_post(
        &self,
        scope: UploadScope,
        request: &CreatePostRequest,
    ) -> Result<JsonValue, PipelineError> {
        self.posts.lock().unwrap().push((scope, request.clone()));
        Ok(json!({"success": true, "data": {"id": 42}}))
    }
}

fn kind_for_mime(mime: &str) -> &'static str {
    if mime.starts_with("image/") {
        "image"
    } else if mime.starts_with("video/") {
        "video"
    } else {
        "document"
    }
}

/// Writes nothing; reports a fixed size per quality.
pub struct FixedSizeCompressor {
    pub estimated_size: u64,
}

#[async_trait]
impl ImageCompressor for FixedSizeCompressor {
    async fn compress(&self, uri: &str, quality: f32) -> anyhow::Result<CompressedImage> {
        Ok(CompressedImage {
            uri: format!("{}-q{}.jpg", uri, (quality * 100.0).round() as u32),
            estimated_size: self.estimated_size,
        })
    }
}

/// Writes a real `<stem>-q<quality>.jpg` into `dir` and reports a fixed size.
pub struct WritingCompressor {
    pub dir: PathBuf,
    pub estimated_size: u64,
}

#[async_trait]
impl ImageCompressor for WritingCompressor {
    async fn compress(&self, uri: &str, quality: f32) -> anyhow::Result<CompressedImage> {
        let source = uri_to_path(uri);
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let target = self
            .dir
            .join(format!("{}-q{}.jpg", stem, (quality * 100.0).round() as u32));
        tokio::fs::write(&target, b"jpeg").await?;
        Ok(CompressedImage {
            uri: path_to_uri(&target),
            estimated_size: self.estimated_size,
        })
    }
}

/// Echo transport that holds the upload carrying `held_filename` until [`Self::release`],
/// and records part files that were gone by the time their upload ran.
pub struct GatedTransport {
    inner: Arc<FakeTransport>,
    held_filename: String,
    release: Notify,
    missing: Mutex<Vec<String>>,
}

impl GatedTransport {
    pub fn holding(filename: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: FakeTransport::echo(),
            held_filename: filename.to_string(),
            release: Notify::new(),
            missing: Mutex::new(Vec::new()),
        })
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn missing_at_upload(&self) -> Vec<String> {
        self.missing.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostTransport for GatedTransport {
    async fn upload_media(&self, body: &MultipartBody) -> Result<UploadResponse, PipelineError> {
        if body.parts.iter().any(|p| p.filename == self.held_filename) {
            self.release.notified().await;
        }
        for part in &body.parts {
            if !uri_to_path(&part.uri).exists() {
                self.missing.lock().unwrap().push(part.uri.clone());
            }
        }
        self.inner.upload_media(body).await
    }

    async fn create_post(
        &self,
        scope: UploadScope,
        request: &CreatePostRequest,
    ) -> Result<JsonValue, PipelineError> {
        self.inner.create_post(scope, request).await
    }
}

pub fn pipeline(transport: Arc<FakeTransport>) -> (PostPipeline, Arc<RecordingEventSink>) {
    let events = Arc::new(RecordingEventSink::new());
    let pipeline = PostPipeline::new(MediaConfig::default(), transport, events.clone());
    (pipeline, events)
}
