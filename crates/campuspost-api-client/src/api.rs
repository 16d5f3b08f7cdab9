//! Domain methods for the CampusPost API client.

use async_trait::async_trait;
use campuspost_core::{CreatePostRequest, PipelineError, UploadResponse, UploadScope};
use campuspost_processing::{uri_to_path, MultipartBody, PostTransport};
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;

use crate::ApiClient;

/// Read every file part from disk and build the upload form.
pub async fn build_upload_form(body: &MultipartBody) -> Result<Form, PipelineError> {
    let mut form = Form::new().percent_encode_noop();

    for part in &body.parts {
        let path = uri_to_path(&part.uri);
        let data = tokio::fs::read(&path).await?;

        let file = Part::bytes(data)
            .file_name(part.filename.clone())
            .mime_str(&part.mime_type)
            .map_err(|e| {
                PipelineError::InvalidInput(format!(
                    "Invalid MIME type {} for {}: {}",
                    part.mime_type, part.filename, e
                ))
            })?;
        form = form.part(part.field_name.clone(), file);
    }

    for (name, value) in body.text_fields() {
        form = form.text(name, value);
    }

    Ok(form)
}

impl ApiClient {
    /// Upload every part of `body` in one multipart request.
    pub async fn upload_media(&self, body: &MultipartBody) -> Result<UploadResponse, PipelineError> {
        let form = build_upload_form(body).await?;
        let path = format!("{}/media/upload", self.api_prefix());

        tracing::info!(files = body.len(), post_type = %body.post_type, "Uploading media");
        let json: JsonValue = self.post_multipart(&path, form).await?;

        Ok(UploadResponse::new(json))
    }

    /// Create a post in the feed for `scope`.
    pub async fn create_post(
        &self,
        scope: UploadScope,
        request: &CreatePostRequest,
    ) -> Result<JsonValue, PipelineError> {
        let path = format!("{}/{}", self.api_prefix(), scope.as_str());

        tracing::info!(
            scope = %scope,
            media = request.media.len(),
            "Creating post"
        );
        let json: JsonValue = self.post_json(&path, request).await?;

        let reply = UploadResponse::new(json);
        if !reply.is_success() {
            return Err(PipelineError::network(
                None,
                reply.message().map(str::to_string),
            ));
        }

        Ok(reply.0)
    }
}

#[async_trait]
impl PostTransport for ApiClient {
    async fn upload_media(&self, body: &MultipartBody) -> Result<UploadResponse, PipelineError> {
        ApiClient::upload_media(self, body).await
    }

    async fn create_post(
        &self,
        scope: UploadScope,
        request: &CreatePostRequest,
    ) -> Result<JsonValue, PipelineError> {
        ApiClient::create_post(self, scope, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;
    use campuspost_core::{PostCategory, PostMediaItem, PostMediaType};
    use campuspost_processing::{path_to_uri, FilePart};
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(ClientConfig::new(server.url(), "test-token")).unwrap()
    }

    fn request() -> CreatePostRequest {
        CreatePostRequest::new(
            PostCategory::News,
            "Library week",
            "New books #reading",
            123,
            vec![PostMediaItem {
                media_type: PostMediaType::Image,
                url: "https://storage.campuspost.app/uploads/posts/images/temp-123-a.jpg"
                    .to_string(),
                filename: "temp-123-a.jpg".to_string(),
                size: 10,
                sort_order: 1,
            }],
        )
    }

    #[tokio::test]
    async fn test_upload_media_sends_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"fake image bytes").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/media/upload")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file_0"; filename="My Photo.jpg""#.to_string()),
                Matcher::Regex(r#"name="post_type""#.to_string()),
                Matcher::Regex("student-posts".to_string()),
                Matcher::Regex("fake image bytes".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": [{"filename": "temp-1-My Photo.jpg", "url": "https://cdn.example.org/temp-1-My Photo.jpg", "type": "image"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let body = MultipartBody {
            parts: vec![FilePart {
                field_name: "file_0".to_string(),
                uri: path_to_uri(&file),
                mime_type: "image/jpeg".to_string(),
                filename: "My Photo.jpg".to_string(),
            }],
            post_type: UploadScope::StudentPosts,
        };

        let response = client(&server).upload_media(&body).await.unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        let items = response.media_items().unwrap();
        assert_eq!(items[0].filename.as_deref(), Some("temp-1-My Photo.jpg"));
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails_before_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/media/upload")
            .expect(0)
            .create_async()
            .await;

        let body = MultipartBody {
            parts: vec![FilePart {
                field_name: "file_0".to_string(),
                uri: "file:///definitely/missing.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                filename: "missing.jpg".to_string(),
            }],
            post_type: UploadScope::SchoolPosts,
        };

        let err = client(&server).upload_media(&body).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_post_sends_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/class-posts")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "type": "announcement",
                    "category": "News",
                    "author_id": 123,
                    "hashtags": ["reading"],
                    "class_id": "5B"
                })),
                Matcher::Regex(r#""filename":"temp-123-a.jpg""#.to_string()),
                Matcher::Regex(r#""sort_order":1"#.to_string()),
            ]))
            .with_status(201)
            .with_body(r#"{"success":true,"data":{"id":9}}"#)
            .create_async()
            .await;

        let request = request().with_class_id(Some("5B".to_string()));
        let reply = client(&server)
            .create_post(UploadScope::ClassPosts, &request)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply["data"]["id"], 9);
    }

    #[tokio::test]
    async fn test_backend_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/school-posts")
            .with_status(422)
            .with_body(r#"{"success":false,"message":"Title is required"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .create_post(UploadScope::SchoolPosts, &request())
            .await
            .unwrap_err();

        match err {
            PipelineError::Network {
                status,
                message,
                from_backend,
            } => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "Title is required");
                assert!(from_backend);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_without_message_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/school-posts")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = client(&server)
            .create_post(UploadScope::SchoolPosts, &request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Network {
                status: Some(502),
                from_backend: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unsuccessful_reply_with_ok_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/school-posts")
            .with_status(200)
            .with_body(r#"{"success":false,"error":"Author not found"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .create_post(UploadScope::SchoolPosts, &request())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Author not found"));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/school-posts")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let err = client(&server)
            .create_post(UploadScope::SchoolPosts, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidResponse(_)));
    }
}
