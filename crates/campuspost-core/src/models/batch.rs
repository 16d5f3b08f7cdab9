use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::media::{RawMediaItem, UploadResponseMediaItem};
use crate::error::PipelineError;

/// A post's media collection, tagged with where it came from.
///
/// Downstream code dispatches on the tag instead of probing item shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", content = "items", rename_all = "lowercase")]
pub enum MediaBatch {
    /// Picker output that has not been through the upload endpoint
    Raw(Vec<RawMediaItem>),
    /// Descriptors returned by the upload endpoint
    Uploaded(Vec<UploadResponseMediaItem>),
}

impl MediaBatch {
    /// Classify an untagged JSON media array.
    ///
    /// The first element decides the origin (`url` without `uri` means uploaded). Every
    /// other element must have the same shape; a mixed array is rejected rather than
    /// half-processed. An empty array is an empty raw batch.
    pub fn detect(values: Vec<JsonValue>) -> Result<Self, PipelineError> {
        let Some(first) = values.first() else {
            return Ok(MediaBatch::Raw(Vec::new()));
        };

        let uploaded = looks_uploaded(first);
        if let Some(position) = values.iter().position(|v| looks_uploaded(v) != uploaded) {
            return Err(PipelineError::MixedBatch { position });
        }

        if uploaded {
            let items = values
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<UploadResponseMediaItem>, _>>()?;
            Ok(MediaBatch::Uploaded(items))
        } else {
            let items = values
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<RawMediaItem>, _>>()?;
            Ok(MediaBatch::Raw(items))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MediaBatch::Raw(items) => items.len(),
            MediaBatch::Uploaded(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn looks_uploaded(value: &JsonValue) -> bool {
    let has = |key: &str| value.get(key).map(|v| !v.is_null()).unwrap_or(false);
    has("url") && !has("uri")
}
