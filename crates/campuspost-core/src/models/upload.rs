//! Upload endpoint response probing.
//!
//! Deployments have returned the uploaded media array under several keys over time.
//! The accepted keys form an ordered list of pure extractors; the first that yields an
//! array wins. Real deployments should converge on a single key, this list is a
//! compatibility shim.

use serde_json::Value as JsonValue;

use super::media::UploadResponseMediaItem;

const MEDIA_KEYS: &[&str] = &["data", "files", "media", "uploaded", "results"];

type MediaExtractor = fn(&JsonValue) -> Option<&Vec<JsonValue>>;

const EXTRACTORS: &[(&str, MediaExtractor)] = &[
    ("data", under_data),
    ("files", under_files),
    ("media", under_media),
    ("uploaded", under_uploaded),
    ("results", under_results),
    ("data.*", nested_under_data),
];

fn under_data(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("data")?.as_array()
}

fn under_files(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("files")?.as_array()
}

fn under_media(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("media")?.as_array()
}

fn under_uploaded(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("uploaded")?.as_array()
}

fn under_results(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("results")?.as_array()
}

fn nested_under_data(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    let data = v.get("data")?.as_object()?;
    MEDIA_KEYS
        .iter()
        .find_map(|key| data.get(*key).and_then(|inner| inner.as_array()))
}

/// Raw JSON body returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResponse(pub JsonValue);

impl UploadResponse {
    pub fn new(body: JsonValue) -> Self {
        Self(body)
    }

    /// `success` flag; an absent flag counts as success.
    pub fn is_success(&self) -> bool {
        self.0
            .get("success")
            .and_then(|s| s.as_bool())
            .unwrap_or(true)
    }

    /// Backend-supplied message, if any.
    pub fn message(&self) -> Option<&str> {
        ["message", "error"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(|m| m.as_str()))
            .filter(|m| !m.trim().is_empty())
    }

    /// Key whose array was accepted, for diagnostics.
    pub fn media_key(&self) -> Option<&'static str> {
        EXTRACTORS
            .iter()
            .find(|(_, extract)| extract(&self.0).is_some())
            .map(|(key, _)| *key)
    }

    /// Media items under the first recognised key.
    ///
    /// Returns `None` if no key holds an array. Elements that do not parse as media
    /// descriptors are returned as descriptors without a URL so the completeness
    /// check reports them instead of them vanishing.
    pub fn media_items(&self) -> Option<Vec<UploadResponseMediaItem>> {
        let raw = EXTRACTORS.iter().find_map(|(_, extract)| extract(&self.0))?;
        Some(
            raw.iter()
                .map(|value| {
                    serde_json::from_value::<UploadResponseMediaItem>(value.clone())
                        .unwrap_or_else(|_| unparseable_item())
                })
                .collect(),
        )
    }
}

fn unparseable_item() -> UploadResponseMediaItem {
    let mut item = UploadResponseMediaItem::new(super::media::MediaKind::Unsupported, "", "");
    item.url = None;
    item.filename = None;
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(url: &str) -> JsonValue {
        json!({"type": "image", "url": url, "filename": "temp-1-a.jpg"})
    }

    #[test]
    fn test_media_found_under_each_known_key() {
        for key in ["data", "files", "media", "uploaded", "results"] {
            let mut body = serde_json::Map::new();
            body.insert("success".to_string(), json!(true));
            body.insert(key.to_string(), json!([item("u")]));
            let response = UploadResponse::new(JsonValue::Object(body));
            let items = response.media_items().unwrap();
            assert_eq!(items.len(), 1, "key {}", key);
            assert_eq!(response.media_key(), Some(key));
        }
    }

    #[test]
    fn test_keys_are_tried_in_order() {
        let response = UploadResponse::new(json!({
            "files": [item("from-files")],
            "data": [item("from-data")]
        }));
        let items = response.media_items().unwrap();
        assert_eq!(items[0].url.as_deref(), Some("from-data"));
    }

    #[test]
    fn test_non_array_keys_are_skipped() {
        let response = UploadResponse::new(json!({
            "data": {"files": [item("nested")]},
            "media": "not-an-array"
        }));
        let items = response.media_items().unwrap();
        assert_eq!(items[0].url.as_deref(), Some("nested"));
        assert_eq!(response.media_key(), Some("data.*"));
    }

    #[test]
    fn test_missing_media_is_none() {
        let response = UploadResponse::new(json!({"success": true}));
        assert!(response.media_items().is_none());
    }

    #[test]
    fn test_success_flag_and_message() {
        let ok = UploadResponse::new(json!({"data": []}));
        assert!(ok.is_success());
        assert!(ok.message().is_none());

        let failed = UploadResponse::new(json!({"success": false, "error": "Quota exceeded"}));
        assert!(!failed.is_success());
        assert_eq!(failed.message(), Some("Quota exceeded"));
    }

    #[test]
    fn test_loosely_typed_size_keeps_item_usable() {
        let response = UploadResponse::new(json!({
            "data": [
                {"type": "image", "url": "https://cdn/a.jpg", "filename": "temp-1-a.jpg", "size": "1024"},
                {"type": "image", "url": "https://cdn/b.jpg", "filename": "temp-1-b.jpg", "size": 1024.0}
            ]
        }));
        let items = response.media_items().unwrap();

        assert_eq!(items[0].usable_url(), Some("https://cdn/a.jpg"));
        assert_eq!(items[1].usable_url(), Some("https://cdn/b.jpg"));
        assert_eq!(items[0].size, Some(1024));
        assert_eq!(items[1].size, Some(1024));
    }

    #[test]
    fn test_unparseable_element_has_no_url() {
        let response = UploadResponse::new(json!({"data": [item("u"), 42]}));
        let items = response.media_items().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1].usable_url().is_none());
    }
}
