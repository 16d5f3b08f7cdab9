use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::media::PostMediaItem;

/// Value of the payload's `type` field. The backend expects this token for every
/// post regardless of the display category.
pub const POST_TYPE_TOKEN: &str = "announcement";

static HASHTAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"#(\w+)").ok());

/// Which feed a post (and its uploaded media) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadScope {
    SchoolPosts,
    ClassPosts,
    StudentPosts,
}

impl UploadScope {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadScope::SchoolPosts => "school-posts",
            UploadScope::ClassPosts => "class-posts",
            UploadScope::StudentPosts => "student-posts",
        }
    }

    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.trim().to_lowercase().as_str() {
            "school-posts" | "school" => Ok(UploadScope::SchoolPosts),
            "class-posts" | "class" => Ok(UploadScope::ClassPosts),
            "student-posts" | "student" => Ok(UploadScope::StudentPosts),
            _ => Err(anyhow::anyhow!("Invalid post scope: {}", s)),
        }
    }
}

impl std::fmt::Display for UploadScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display category, serialized capitalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostCategory {
    Announcement,
    Event,
    News,
    Achievement,
}

impl PostCategory {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.trim().to_lowercase().as_str() {
            "announcement" => Ok(PostCategory::Announcement),
            "event" => Ok(PostCategory::Event),
            "news" => Ok(PostCategory::News),
            "achievement" => Ok(PostCategory::Achievement),
            _ => Err(anyhow::anyhow!("Invalid post category: {}", s)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostCategory::Announcement => "Announcement",
            PostCategory::Event => "Event",
            PostCategory::News => "News",
            PostCategory::Achievement => "Achievement",
        }
    }
}

/// JSON body of the post-creation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(rename = "type")]
    pub post_type: String,
    pub category: PostCategory,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub hashtags: Vec<String>,
    pub media: Vec<PostMediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl CreatePostRequest {
    /// Build a request with the fixed type token and hashtags taken from the content.
    pub fn new(
        category: PostCategory,
        title: impl Into<String>,
        content: impl Into<String>,
        author_id: i64,
        media: Vec<PostMediaItem>,
    ) -> Self {
        let content = content.into();
        Self {
            post_type: POST_TYPE_TOKEN.to_string(),
            category,
            title: title.into(),
            hashtags: extract_hashtags(&content),
            content,
            author_id,
            media,
            class_id: None,
            grade: None,
        }
    }

    pub fn with_class_id(mut self, class_id: Option<String>) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn with_grade(mut self, grade: Option<String>) -> Self {
        self.grade = grade;
        self
    }
}

/// `#tag` tokens in first-seen order, without the `#`, deduplicated.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let Some(pattern) = HASHTAG.as_ref() else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for cap in pattern.captures_iter(content) {
        let tag = cap[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_is_always_announcement() {
        for category in [
            PostCategory::Announcement,
            PostCategory::Event,
            PostCategory::News,
            PostCategory::Achievement,
        ] {
            let request = CreatePostRequest::new(category, "t", "c", 1, vec![]);
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["type"], "announcement");
            assert_eq!(json["category"], category.label());
        }
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let request = CreatePostRequest::new(PostCategory::News, "t", "c", 5, vec![]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("class_id").is_none());
        assert!(json.get("grade").is_none());

        let request = request
            .with_class_id(Some("10-A".to_string()))
            .with_grade(Some("10".to_string()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["class_id"], "10-A");
        assert_eq!(json["grade"], "10");
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("Sports day! #sports #SchoolLife and again #sports"),
            vec!["sports".to_string(), "SchoolLife".to_string()]
        );
        assert!(extract_hashtags("no tags here").is_empty());
        assert!(extract_hashtags("# alone").is_empty());
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(
            UploadScope::parse("class-posts").unwrap(),
            UploadScope::ClassPosts
        );
        assert_eq!(UploadScope::parse("School").unwrap(), UploadScope::SchoolPosts);
        assert!(UploadScope::parse("teacher-posts").is_err());
        assert_eq!(
            serde_json::to_value(UploadScope::StudentPosts).unwrap(),
            serde_json::json!("student-posts")
        );
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(PostCategory::parse("EVENT").unwrap(), PostCategory::Event);
        assert!(PostCategory::parse("memo").is_err());
    }
}
