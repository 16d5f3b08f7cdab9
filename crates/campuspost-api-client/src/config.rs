use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the CampusPost API
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// CAMPUSPOST_API_URL (or API_URL), CAMPUSPOST_API_TOKEN (or JWT_TOKEN),
    /// CAMPUSPOST_API_VERSION, CAMPUSPOST_API_TIMEOUT_SECS.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CAMPUSPOST_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let token = lookup("CAMPUSPOST_API_TOKEN")
            .or_else(|| lookup("JWT_TOKEN"))
            .ok_or_else(|| {
                anyhow::anyhow!("Missing API token. Set CAMPUSPOST_API_TOKEN or JWT_TOKEN")
            })?;

        let mut config = Self::new(base_url.trim(), token.trim());
        if let Some(version) = lookup("CAMPUSPOST_API_VERSION") {
            config.api_version = version.trim().trim_matches('/').to_string();
        }
        config.timeout = Duration::from_secs(
            lookup("CAMPUSPOST_API_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "CAMPUSPOST_API_URL must be an http(s) URL, got {}",
                self.base_url
            ));
        }
        if self.token.is_empty() {
            return Err(anyhow::anyhow!("API token cannot be empty"));
        }
        if self.api_version.is_empty() {
            return Err(anyhow::anyhow!("CAMPUSPOST_API_VERSION cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(anyhow::anyhow!("Request timeout must be greater than zero"));
        }
        Ok(())
    }
}
