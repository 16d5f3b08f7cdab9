//! Image recompression before upload.
//!
//! Large photos are re-encoded at decreasing quality until the estimate fits the target
//! size or the quality ladder runs out. A failing compressor never fails the upload; the
//! original file is sent instead.

use async_trait::async_trait;
use campuspost_core::config::CompressionPolicy;
use campuspost_core::{EventSink, MediaEvent};

/// Result of one compression call
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub uri: String,
    pub estimated_size: u64,
}

/// Image compression capability.
#[async_trait]
pub trait ImageCompressor: Send + Sync {
    /// Re-encode the image at `uri` with `quality` in (0, 1].
    async fn compress(&self, uri: &str, quality: f32) -> anyhow::Result<CompressedImage>;
}

/// Images of unknown size are left alone.
pub fn needs_compression(size: Option<u64>, policy: &CompressionPolicy) -> bool {
    size.is_some_and(|s| s >= policy.threshold_bytes)
}

/// Every output a compression run produced, plus the one to keep.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompressionRun {
    /// Smallest output, if it beats the original
    pub selected: Option<CompressedImage>,
    /// URIs of every file the compressor wrote, selected or not
    pub outputs: Vec<String>,
}

/// Walk the quality ladder until the estimate is at or below the target.
///
/// Any compressor error ends the run and the original is used.
pub async fn compress_with_policy(
    compressor: &dyn ImageCompressor,
    uri: &str,
    original_size: u64,
    index: usize,
    policy: &CompressionPolicy,
    events: &dyn EventSink,
) -> CompressionRun {
    let mut run = CompressionRun::default();

    for quality in policy.qualities() {
        let attempt = match compressor.compress(uri, quality).await {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::warn!(
                    index = index,
                    quality = quality,
                    error = %e,
                    "Image compression failed, using original"
                );
                events.emit(MediaEvent::CompressionFellBack {
                    index,
                    error: e.to_string(),
                });
                run.selected = None;
                return run;
            }
        };

        events.emit(MediaEvent::CompressionAttempted {
            index,
            quality,
            estimated_size: attempt.estimated_size,
        });
        run.outputs.push(attempt.uri.clone());

        let reached_target = attempt.estimated_size <= policy.target_bytes;
        let is_better = run
            .selected
            .as_ref()
            .map_or(true, |best| attempt.estimated_size < best.estimated_size);
        if is_better {
            run.selected = Some(attempt);
        }
        if reached_target {
            break;
        }
    }

    run.selected = run
        .selected
        .filter(|best| best.estimated_size < original_size);
    run
}

#[cfg(feature = "image")]
pub use jpeg::JpegCompressor;

#[cfg(feature = "image")]
mod jpeg {
    use std::path::PathBuf;

    use anyhow::Context;
    use async_trait::async_trait;
    use image::codecs::jpeg::JpegEncoder;
    use uuid::Uuid;

    use super::{CompressedImage, ImageCompressor};
    use crate::staging::{path_to_uri, uri_to_path};

    /// Re-encodes images as JPEG into a cache directory.
    #[derive(Debug, Clone)]
    pub struct JpegCompressor {
        output_dir: PathBuf,
    }

    impl JpegCompressor {
        pub fn new(output_dir: impl Into<PathBuf>) -> Self {
            Self {
                output_dir: output_dir.into(),
            }
        }

        /// Decode any supported format and encode as JPEG at `quality` × 100.
        pub fn encode(data: &[u8], quality: f32) -> anyhow::Result<Vec<u8>> {
            let img = image::load_from_memory(data).context("Failed to decode image")?;
            let rgb = img.to_rgb8();

            let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            let mut buffer = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            rgb.write_with_encoder(encoder)
                .context("Failed to encode JPEG")?;

            Ok(buffer)
        }
    }

    #[async_trait]
    impl ImageCompressor for JpegCompressor {
        async fn compress(&self, uri: &str, quality: f32) -> anyhow::Result<CompressedImage> {
            let source = uri_to_path(uri);
            let data = tokio::fs::read(&source)
                .await
                .with_context(|| format!("Failed to read {}", source.display()))?;

            let encoded = tokio::task::spawn_blocking(move || Self::encode(&data, quality))
                .await
                .context("Compression task panicked")??;

            tokio::fs::create_dir_all(&self.output_dir).await?;
            let path = self
                .output_dir
                .join(format!("compressed-{}.jpg", Uuid::new_v4()));
            tokio::fs::write(&path, &encoded)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            tracing::debug!(
                source = %source.display(),
                output = %path.display(),
                quality = quality,
                size = encoded.len(),
                "Image recompressed"
            );

            Ok(CompressedImage {
                uri: path_to_uri(&path),
                estimated_size: encoded.len() as u64,
            })
        }
    }
}
