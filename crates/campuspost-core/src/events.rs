//! Typed pipeline events.
//!
//! The reconciliation core reports what it decided (which filename tier won, why a batch
//! was rejected, when compression fell back) as discrete [`MediaEvent`] values pushed into
//! an injected [`EventSink`]. Production code logs them through `tracing`; tests record
//! them and assert on the structured values.

use std::sync::Mutex;

use serde::Serialize;

use crate::models::FilenameSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    FilenameResolved {
        index: usize,
        source: FilenameSource,
        filename: String,
    },
    ExtractionMissed {
        index: usize,
        candidate: String,
    },
    ValidationFailed {
        reason: &'static str,
        message: String,
    },
    CompressionAttempted {
        index: usize,
        quality: f32,
        estimated_size: u64,
    },
    CompressionFellBack {
        index: usize,
        error: String,
    },
    ConsistencyViolated {
        index: usize,
        url: String,
        filename: String,
    },
    UploadIncomplete {
        expected: usize,
        received: usize,
        missing_urls: usize,
    },
    StagedFileCleanupFailed {
        uri: String,
        error: String,
    },
}

impl MediaEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::FilenameResolved { .. } => "filename_resolved",
            MediaEvent::ExtractionMissed { .. } => "extraction_missed",
            MediaEvent::ValidationFailed { .. } => "validation_failed",
            MediaEvent::CompressionAttempted { .. } => "compression_attempted",
            MediaEvent::CompressionFellBack { .. } => "compression_fell_back",
            MediaEvent::ConsistencyViolated { .. } => "consistency_violated",
            MediaEvent::UploadIncomplete { .. } => "upload_incomplete",
            MediaEvent::StagedFileCleanupFailed { .. } => "staged_file_cleanup_failed",
        }
    }
}

/// Receiver for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MediaEvent);
}

/// Logs every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: MediaEvent) {
        match &event {
            MediaEvent::FilenameResolved {
                index,
                source,
                filename,
            } => tracing::debug!(
                event = event.name(),
                index,
                source = source.as_str(),
                filename = %filename,
                "Filename resolved"
            ),
            MediaEvent::ExtractionMissed { index, candidate } => tracing::debug!(
                event = event.name(),
                index,
                candidate = %candidate,
                "Temp filename did not match any known pattern"
            ),
            MediaEvent::ValidationFailed { reason, message } => tracing::info!(
                event = event.name(),
                reason,
                message = %message,
                "Media validation failed"
            ),
            MediaEvent::CompressionAttempted {
                index,
                quality,
                estimated_size,
            } => tracing::debug!(
                event = event.name(),
                index,
                quality,
                estimated_size,
                "Image compression attempt"
            ),
            MediaEvent::CompressionFellBack { index, error } => tracing::warn!(
                event = event.name(),
                index,
                error = %error,
                "Image compression failed, using original image"
            ),
            MediaEvent::ConsistencyViolated {
                index,
                url,
                filename,
            } => tracing::warn!(
                event = event.name(),
                index,
                url = %url,
                filename = %filename,
                "Media URL does not end with its filename"
            ),
            MediaEvent::UploadIncomplete {
                expected,
                received,
                missing_urls,
            } => tracing::warn!(
                event = event.name(),
                expected,
                received,
                missing_urls,
                "Upload response is incomplete"
            ),
            MediaEvent::StagedFileCleanupFailed { uri, error } => tracing::warn!(
                event = event.name(),
                uri = %uri,
                error = %error,
                "Failed to delete staged file"
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: MediaEvent) {}
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<MediaEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MediaEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events with the given name, e.g. `"filename_resolved"`.
    pub fn named(&self, name: &str) -> Vec<MediaEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.name() == name)
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: MediaEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = MediaEvent::FilenameResolved {
            index: 0,
            source: FilenameSource::DeclaredName,
            filename: "a.jpg".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "filename_resolved");
        assert_eq!(json["source"], "declared_name");
        assert_eq!(json["filename"], "a.jpg");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.emit(MediaEvent::ValidationFailed {
            reason: "too_many_files",
            message: "Too many".to_string(),
        });
        sink.emit(MediaEvent::ExtractionMissed {
            index: 2,
            candidate: "temp-x".to_string(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "validation_failed");
        assert_eq!(sink.named("extraction_missed").len(), 1);
    }
}
