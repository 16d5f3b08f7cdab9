//! Configuration module
//!
//! Media limits, compression policy and storage layout used by the processing
//! pipeline. Defaults mirror what the backend enforces; every value can be overridden
//! through `CAMPUSPOST_*` environment variables (a `.env` file is honoured).

use std::env;

// Limits
const MAX_FILES: usize = 10;
const MAX_TOTAL_SIZE_MB: u64 = 50;
const MAX_VIDEO_SIZE_MB: u64 = 5;
// Compression policy
const COMPRESSION_THRESHOLD_BYTES: u64 = 1024 * 1024;
const COMPRESSION_TARGET_BYTES: u64 = 800 * 1024;
const COMPRESSION_START_QUALITY: f32 = 0.8;
const COMPRESSION_QUALITY_STEP: f32 = 0.2;
const COMPRESSION_MIN_QUALITY: f32 = 0.3;
const COMPRESSION_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_STORAGE_BASE_URL: &str = "https://storage.campuspost.app/uploads/posts";

#[derive(Clone, Debug, PartialEq)]
pub struct CompressionPolicy {
    /// Images at or above this size are recompressed
    pub threshold_bytes: u64,
    /// Compression stops once the estimate is at or below this size
    pub target_bytes: u64,
    pub start_quality: f32,
    pub quality_step: f32,
    pub min_quality: f32,
    pub max_attempts: u32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            threshold_bytes: COMPRESSION_THRESHOLD_BYTES,
            target_bytes: COMPRESSION_TARGET_BYTES,
            start_quality: COMPRESSION_START_QUALITY,
            quality_step: COMPRESSION_QUALITY_STEP,
            min_quality: COMPRESSION_MIN_QUALITY,
            max_attempts: COMPRESSION_MAX_ATTEMPTS,
        }
    }
}

impl CompressionPolicy {
    /// Quality levels to try, in order: start, start - step, ... never below the floor,
    /// at most `max_attempts` of them.
    pub fn qualities(&self) -> Vec<f32> {
        let mut out = Vec::new();
        let mut quality = self.start_quality;
        while out.len() < self.max_attempts as usize && quality >= self.min_quality - f32::EPSILON
        {
            out.push((quality * 100.0).round() / 100.0);
            quality -= self.quality_step;
        }
        out
    }
}

/// Media pipeline configuration
#[derive(Clone, Debug, PartialEq)]
pub struct MediaConfig {
    pub max_files: usize,
    pub max_total_size_bytes: u64,
    pub max_video_size_bytes: u64,
    pub compression: CompressionPolicy,
    /// Base of reconstructed media URLs: `{base}/{images|videos|documents}/{filename}`
    pub storage_base_url: String,
    pub image_allowed_extensions: Vec<String>,
    pub video_allowed_extensions: Vec<String>,
    pub document_allowed_extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_total_size_bytes: MAX_TOTAL_SIZE_MB * 1024 * 1024,
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            compression: CompressionPolicy::default(),
            storage_base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
            image_allowed_extensions: split_list("jpg,jpeg,png,gif,webp,heic,heif"),
            video_allowed_extensions: split_list("mp4,mov,m4v,3gp,webm"),
            document_allowed_extensions: split_list("pdf,doc,docx,xls,xlsx,ppt,pptx,txt,csv"),
        }
    }
}

impl MediaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_or = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let parse_f32_or = |key: &str, default: f32| -> f32 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let compression = CompressionPolicy {
            threshold_bytes: parse_or(
                "CAMPUSPOST_COMPRESSION_THRESHOLD_BYTES",
                defaults.compression.threshold_bytes,
            ),
            target_bytes: parse_or(
                "CAMPUSPOST_COMPRESSION_TARGET_BYTES",
                defaults.compression.target_bytes,
            ),
            start_quality: parse_f32_or(
                "CAMPUSPOST_COMPRESSION_START_QUALITY",
                defaults.compression.start_quality,
            ),
            quality_step: parse_f32_or(
                "CAMPUSPOST_COMPRESSION_QUALITY_STEP",
                defaults.compression.quality_step,
            ),
            min_quality: parse_f32_or(
                "CAMPUSPOST_COMPRESSION_MIN_QUALITY",
                defaults.compression.min_quality,
            ),
            max_attempts: u32::try_from(parse_or(
                "CAMPUSPOST_COMPRESSION_MAX_ATTEMPTS",
                u64::from(defaults.compression.max_attempts),
            ))
            .map_err(|_| anyhow::anyhow!("CAMPUSPOST_COMPRESSION_MAX_ATTEMPTS is too large"))?,
        };

        let config = MediaConfig {
            max_files: usize::try_from(parse_or("CAMPUSPOST_MAX_FILES", defaults.max_files as u64))
                .map_err(|_| anyhow::anyhow!("CAMPUSPOST_MAX_FILES is too large"))?,
            max_total_size_bytes: mib_to_bytes(
                "CAMPUSPOST_MAX_TOTAL_SIZE_MB",
                parse_or("CAMPUSPOST_MAX_TOTAL_SIZE_MB", MAX_TOTAL_SIZE_MB),
            )?,
            max_video_size_bytes: mib_to_bytes(
                "CAMPUSPOST_MAX_VIDEO_SIZE_MB",
                parse_or("CAMPUSPOST_MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB),
            )?,
            compression,
            storage_base_url: lookup("CAMPUSPOST_STORAGE_BASE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.storage_base_url),
            image_allowed_extensions: lookup("CAMPUSPOST_IMAGE_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.image_allowed_extensions),
            video_allowed_extensions: lookup("CAMPUSPOST_VIDEO_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.video_allowed_extensions),
            document_allowed_extensions: lookup("CAMPUSPOST_DOCUMENT_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.document_allowed_extensions),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("CAMPUSPOST_MAX_FILES must be at least 1"));
        }

        if self.max_total_size_bytes == 0 || self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("Size limits must be greater than zero"));
        }

        let c = &self.compression;
        if !(c.start_quality > 0.0 && c.start_quality <= 1.0) {
            return Err(anyhow::anyhow!(
                "Compression start quality must be in (0, 1], got {}",
                c.start_quality
            ));
        }
        if c.min_quality <= 0.0 || c.min_quality > c.start_quality {
            return Err(anyhow::anyhow!(
                "Compression minimum quality must be in (0, start quality], got {}",
                c.min_quality
            ));
        }
        if c.quality_step <= 0.0 {
            return Err(anyhow::anyhow!("Compression quality step must be positive"));
        }
        if c.target_bytes > c.threshold_bytes {
            return Err(anyhow::anyhow!(
                "Compression target ({} bytes) cannot exceed the threshold ({} bytes)",
                c.target_bytes,
                c.threshold_bytes
            ));
        }

        if !self.storage_base_url.starts_with("http://")
            && !self.storage_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "CAMPUSPOST_STORAGE_BASE_URL must be an http(s) URL"
            ));
        }

        Ok(())
    }
}

fn mib_to_bytes(key: &str, mib: u64) -> Result<u64, anyhow::Error> {
    mib.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", key, mib))
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MediaConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, MediaConfig::default());
        assert_eq!(config.max_files, 10);
        assert_eq!(config.max_total_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_video_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.compression.target_bytes, 800 * 1024);
    }

    #[test]
    fn test_default_quality_ladder() {
        assert_eq!(CompressionPolicy::default().qualities(), vec![0.8, 0.6, 0.4]);
    }

    #[test]
    fn test_quality_ladder_respects_floor() {
        let policy = CompressionPolicy {
            start_quality: 0.5,
            max_attempts: 5,
            ..CompressionPolicy::default()
        };
        assert_eq!(policy.qualities(), vec![0.5, 0.3]);
    }

    #[test]
    fn test_overrides() {
        let config = MediaConfig::from_lookup(lookup_from(&[
            ("CAMPUSPOST_MAX_FILES", "4"),
            ("CAMPUSPOST_MAX_VIDEO_SIZE_MB", "20"),
            ("CAMPUSPOST_STORAGE_BASE_URL", "https://cdn.example.org/media/"),
            ("CAMPUSPOST_IMAGE_EXTENSIONS", ".JPG, png"),
            ("CAMPUSPOST_MAX_TOTAL_SIZE_MB", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.max_files, 4);
        assert_eq!(config.max_video_size_bytes, 20 * 1024 * 1024);
        assert_eq!(config.max_total_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.storage_base_url, "https://cdn.example.org/media");
        assert_eq!(config.image_allowed_extensions, vec!["jpg", "png"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MediaConfig::from_lookup(lookup_from(&[("CAMPUSPOST_MAX_FILES", "0")])).is_err());
        assert!(MediaConfig::from_lookup(lookup_from(&[(
            "CAMPUSPOST_COMPRESSION_START_QUALITY",
            "1.5"
        )]))
        .is_err());
        assert!(MediaConfig::from_lookup(lookup_from(&[(
            "CAMPUSPOST_STORAGE_BASE_URL",
            "ftp://files"
        )]))
        .is_err());
    }

    #[test]
    fn test_oversized_limits_are_rejected() {
        let huge = u64::MAX.to_string();
        for key in ["CAMPUSPOST_MAX_TOTAL_SIZE_MB", "CAMPUSPOST_MAX_VIDEO_SIZE_MB"] {
            let err = MediaConfig::from_lookup(lookup_from(&[(key, huge.as_str())])).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
        assert!(MediaConfig::from_lookup(lookup_from(&[(
            "CAMPUSPOST_COMPRESSION_MAX_ATTEMPTS",
            "4294967296"
        )]))
        .is_err());
    }
}
