//! CampusPost Media Processing Library
//!
//! This crate turns picker media into upload-ready files and upload responses into post
//! payload media: batch validation, image recompression, normalization, multipart
//! assembly, cache-file staging and the end-to-end publishing pipeline.

pub mod compression;
pub mod multipart;
pub mod normalize;
pub mod pipeline;
pub mod staging;
pub mod transport;
pub mod validator;

// Re-export commonly used types
pub use compression::{
    compress_with_policy, needs_compression, CompressedImage, CompressionRun, ImageCompressor,
};
pub use multipart::{assemble_upload_body, correct_mime_type, FilePart, MultipartBody};
pub use normalize::MediaNormalizer;
pub use pipeline::{
    check_upload_complete, PostDraft, PostPipeline, Progress, ProgressStage, PublishOutcome,
};
pub use staging::{path_to_uri, uri_to_path, StagedFile, StagedFiles};
pub use transport::PostTransport;
pub use validator::{validate_batch, validate_media, MediaValidator};

#[cfg(feature = "image")]
pub use compression::JpegCompressor;
