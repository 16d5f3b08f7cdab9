//! HTTP client for the CampusPost API.
//!
//! Provides a minimal bearer-authenticated client with JSON and multipart POST helpers,
//! and the domain methods the publishing pipeline needs (media upload, post creation).
//! The CLI uses this client as its [`PostTransport`](campuspost_processing::PostTransport).

pub mod api;
pub mod config;

use anyhow::Context;
use campuspost_core::{PipelineError, UploadResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub use config::ClientConfig;

/// HTTP client for the CampusPost API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Create client from `CAMPUSPOST_API_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// API version prefix (e.g. "/api/v1").
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.config.api_version)
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.config.token),
        )
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PipelineError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));
        self.send(request, &url).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, PipelineError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));
        self.send(request, &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, PipelineError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to send request");
            PipelineError::network(None, None)
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                body = %text,
                "API request failed"
            );
            return Err(PipelineError::network(
                Some(status.as_u16()),
                backend_message(&text),
            ));
        }

        serde_json::from_str(&text).map_err(|e| {
            PipelineError::InvalidResponse(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// `message` or `error` from a JSON error body.
fn backend_message(body: &str) -> Option<String> {
    let json: JsonValue = serde_json::from_str(body).ok()?;
    UploadResponse::new(json).message().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message() {
        assert_eq!(
            backend_message(r#"{"success":false,"message":"Title is required"}"#).as_deref(),
            Some("Title is required")
        );
        assert_eq!(
            backend_message(r#"{"error":"Forbidden"}"#).as_deref(),
            Some("Forbidden")
        );
        assert_eq!(backend_message("<html>Bad Gateway</html>"), None);
        assert_eq!(backend_message(r#"{"message":"  "}"#), None);
    }

    #[test]
    fn test_urls() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:3000/", "t")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.api_prefix(), "/api/v1");
        assert_eq!(
            client.build_url("/api/v1/media/upload"),
            "http://localhost:3000/api/v1/media/upload"
        );
    }
}
