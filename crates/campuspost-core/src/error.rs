//! Error types module
//!
//! `ValidationError` covers everything detected before a network call. `PipelineError`
//! unifies validation, upload completeness, transport and boundary failures for the
//! whole post submission. Soft failures (compression, extraction misses, cleanup) never
//! become errors; they are reported through [`crate::events`].

use std::io;

use serde::{Deserialize, Serialize};

const MIB: f64 = 1024.0 * 1024.0;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like incomplete uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be presented to the user and logged
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether a user-initiated re-submission may succeed
    fn is_recoverable(&self) -> bool;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Pre-network validation failures. Never retried automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Too many files: {count} selected (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Media item {index} has no file URI")]
    MissingUri { index: usize },

    #[error("Media item {index} has an unsupported media type")]
    UnsupportedType { index: usize },

    #[error("File type .{extension} is not allowed for {kind} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        kind: String,
        allowed: Vec<String>,
    },

    #[error(
        "Video file is too large ({}). Maximum allowed size is {}.",
        mb(.size),
        limit_mb(.max)
    )]
    VideoTooLarge { size: u64, max: u64 },

    #[error("File too large: {} (max: {})", mb(.size), limit_mb(.max))]
    FileTooLarge { size: u64, max: u64 },

    #[error(
        "Selected files are too large in total: {} (max: {})",
        mb(.total),
        limit_mb(.max)
    )]
    TotalTooLarge { total: u64, max: u64 },
}

impl ValidationError {
    /// Short machine-readable reason used in `validation_failed` events.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::TooManyFiles { .. } => "too_many_files",
            ValidationError::MissingUri { .. } => "missing_uri",
            ValidationError::UnsupportedType { .. } => "unsupported_type",
            ValidationError::InvalidExtension { .. } => "invalid_extension",
            ValidationError::VideoTooLarge { .. } => "video_too_large",
            ValidationError::FileTooLarge { .. } => "file_too_large",
            ValidationError::TotalTooLarge { .. } => "total_too_large",
        }
    }
}

/// `6291456` → `6.00MB`
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / MIB)
}

/// Limits print without decimals when whole: `5242880` → `5MB`
fn format_limit_mb(bytes: u64) -> String {
    let mb = bytes as f64 / MIB;
    if mb.fract() == 0.0 {
        format!("{}MB", mb as u64)
    } else {
        format!("{:.2}MB", mb)
    }
}

fn mb(bytes: &u64) -> String {
    format_mb(*bytes)
}

fn limit_mb(bytes: &u64) -> String {
    format_limit_mb(*bytes)
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Structured validation outcome: `{"isValid": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

impl From<&Result<(), ValidationError>> for ValidationResult {
    fn from(result: &Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult::valid(),
            Err(e) => ValidationResult::invalid(e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upload incomplete: expected {expected} files, received {received} ({missing_urls} without URL)")]
    UploadIncomplete {
        expected: usize,
        received: usize,
        missing_urls: usize,
    },

    #[error("Network error{}: {}", status_suffix(.status), .message)]
    Network {
        status: Option<u16>,
        message: String,
        /// Whether `message` came from the backend and can be shown verbatim
        from_backend: bool,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Mixed media batch: item {position} differs from the first item")]
    MixedBatch { position: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn network(status: Option<u16>, backend_message: Option<String>) -> Self {
        match backend_message {
            Some(message) => PipelineError::Network {
                status,
                message,
                from_backend: true,
            },
            None => PipelineError::Network {
                status,
                message: GENERIC_NETWORK_MESSAGE.to_string(),
                from_backend: false,
            },
        }
    }
}

const GENERIC_NETWORK_MESSAGE: &str =
    "Could not reach the server. Please check your connection and try again.";

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidResponse(format!("JSON parsing error: {}", err))
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Internal(err.to_string())
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::UploadIncomplete { .. } => "UPLOAD_INCOMPLETE",
            PipelineError::Network { .. } => "NETWORK_ERROR",
            PipelineError::InvalidResponse(_) => "INVALID_RESPONSE",
            PipelineError::MixedBatch { .. } => "MIXED_BATCH",
            PipelineError::InvalidInput(_) => "INVALID_INPUT",
            PipelineError::Io(_) => "IO_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::UploadIncomplete { .. } | PipelineError::Network { .. }
        )
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::Validation(e) => e.to_string(),
            PipelineError::UploadIncomplete { .. } => {
                "Some files failed to upload. Please try again.".to_string()
            }
            PipelineError::Network { message, .. } => message.clone(),
            PipelineError::InvalidResponse(_) => {
                "The server returned an unexpected response. Please try again.".to_string()
            }
            PipelineError::MixedBatch { .. } | PipelineError::InvalidInput(_) => self.to_string(),
            PipelineError::Io(_) | PipelineError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PipelineError::Validation(_)
            | PipelineError::MixedBatch { .. }
            | PipelineError::InvalidInput(_) => LogLevel::Debug,
            PipelineError::UploadIncomplete { .. } | PipelineError::Network { .. } => {
                LogLevel::Warn
            }
            PipelineError::InvalidResponse(_)
            | PipelineError::Io(_)
            | PipelineError::Internal(_) => LogLevel::Error,
        }
    }
}
