//! CampusPost Core Library
//!
//! This crate provides the media domain models, error types, configuration, typed
//! pipeline events, and the filename reconciliation logic (sanitize, extract, resolve)
//! shared by the processing pipeline, the API client, and the CLI.

pub mod config;
pub mod error;
pub mod events;
pub mod filename;
pub mod mime;
pub mod models;

// Re-export commonly used types
pub use config::MediaConfig;
pub use error::{ErrorMetadata, LogLevel, PipelineError, ValidationError, ValidationResult};
pub use events::{EventSink, MediaEvent, NoOpEventSink, RecordingEventSink, TracingEventSink};
pub use filename::{
    extract_from_uri, extract_original_from_temp, sanitize_filename, FilenameResolver,
    Resolution,
};
pub use models::{
    CreatePostRequest, FilenameCandidates, FilenameSource, MediaBatch, MediaKind, PostCategory,
    PostMediaItem, PostMediaType, ProcessedMediaItem, RawMediaItem, UploadResponse,
    UploadResponseMediaItem, UploadScope,
};
