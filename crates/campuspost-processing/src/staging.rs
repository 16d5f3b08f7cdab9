//! Transient cache files created while preparing an upload.
//!
//! Picker URIs are sometimes copied into a cache directory before the network layer can
//! read them, and compression writes new files next to them. Every such file is tracked
//! here and removed once the pipeline finishes, whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use campuspost_core::{EventSink, MediaEvent, PipelineError};
use percent_encoding::percent_decode_str;
use uuid::Uuid;

/// A staged local copy
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub uri: String,
    pub size: u64,
}

/// Tracks cache files by URI for best-effort cleanup.
pub struct StagedFiles {
    uris: Mutex<Vec<String>>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StagedFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFiles")
            .field("uris", &self.tracked())
            .finish_non_exhaustive()
    }
}

impl StagedFiles {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            uris: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn track(&self, uri: impl Into<String>) {
        let uri = uri.into();
        let mut uris = self.uris.lock().unwrap_or_else(|e| e.into_inner());
        if !uris.contains(&uri) {
            uris.push(uri);
        }
    }

    pub fn tracked(&self) -> Vec<String> {
        self.uris
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Copy `source_uri` into `cache_dir` under a unique name and track the copy.
    ///
    /// The original extension is kept so MIME inference still works on the copy.
    pub async fn stage_copy(
        &self,
        source_uri: &str,
        cache_dir: &Path,
    ) -> Result<StagedFile, PipelineError> {
        let source = uri_to_path(source_uri);
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        tokio::fs::create_dir_all(cache_dir).await?;
        let target = cache_dir.join(format!("staged-{}{}", Uuid::new_v4(), extension));
        let size = tokio::fs::copy(&source, &target).await?;

        let uri = path_to_uri(&target);
        self.track(uri.clone());

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            size = size,
            "Staged media file"
        );

        Ok(StagedFile { uri, size })
    }

    /// Delete every tracked file. Failures are reported and skipped; the remaining
    /// files are still removed. Returns the number of files deleted.
    pub async fn cleanup(&self) -> usize {
        let uris = std::mem::take(&mut *self.uris.lock().unwrap_or_else(|e| e.into_inner()));

        let mut removed = 0;
        for uri in uris {
            match tokio::fs::remove_file(uri_to_path(&uri)).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(uri = %uri, error = %e, "Failed to delete staged file");
                    self.events.emit(MediaEvent::StagedFileCleanupFailed {
                        uri,
                        error: e.to_string(),
                    });
                }
            }
        }
        removed
    }
}

/// Local path for a `file://` URI or a bare path.
pub fn uri_to_path(uri: &str) -> PathBuf {
    match uri.strip_prefix("file://") {
        Some(rest) => PathBuf::from(percent_decode_str(rest).decode_utf8_lossy().into_owned()),
        None => PathBuf::from(uri),
    }
}

pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
