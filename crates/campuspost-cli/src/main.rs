//! CampusPost CLI: filename tools and post publishing against the CampusPost API.
//!
//! Set CAMPUSPOST_API_TOKEN and CAMPUSPOST_API_URL (or API_URL) for `publish`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use campuspost_api_client::ApiClient;
use campuspost_cli::{init_tracing, media_item_from_path, resolve_json};
use campuspost_core::{
    sanitize_filename, FilenameResolver, MediaConfig, PostCategory, RawMediaItem,
    TracingEventSink, UploadScope,
};
use campuspost_processing::{
    validate_media, JpegCompressor, PostDraft, PostPipeline, StagedFiles,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "campuspost", about = "CampusPost media and post CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize a filename
    Sanitize {
        /// Candidate filename
        name: String,
    },
    /// Resolve filenames for a JSON media object or array
    Resolve {
        /// JSON text, or @path to read it from a file
        json: String,
    },
    /// Validate local files as one media batch
    Validate {
        /// Files to validate
        files: Vec<PathBuf>,
    },
    /// Upload files and create a post
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// announcement, event, news or achievement
        #[arg(long, default_value = "announcement")]
        category: String,
        /// school-posts, class-posts or student-posts
        #[arg(long, default_value = "school-posts")]
        scope: String,
        #[arg(long)]
        author_id: i64,
        /// Required for class posts
        #[arg(long)]
        class_id: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        /// Directory for staged copies and compressed images
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Copy files into the cache directory before uploading
        #[arg(long)]
        stage: bool,
        /// Skip image recompression
        #[arg(long)]
        no_compress: bool,
        /// Files to attach
        files: Vec<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn media_from_paths(files: &[PathBuf]) -> anyhow::Result<Vec<RawMediaItem>> {
    files.iter().map(|f| media_item_from_path(f)).collect()
}

/// Point every item at a staged copy in `cache_dir`.
async fn stage_media(
    staged_files: &StagedFiles,
    media: &mut [RawMediaItem],
    cache_dir: &Path,
) -> anyhow::Result<()> {
    for item in media.iter_mut() {
        if let Some(uri) = item.uri.as_deref() {
            let staged = staged_files.stage_copy(uri, cache_dir).await?;
            item.uri = Some(staged.uri);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize { name } => {
            println!("{}", sanitize_filename(&name));
        }
        Commands::Resolve { json } => {
            let input = match json.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path))?,
                None => json,
            };
            let resolver = FilenameResolver::new(Arc::new(TracingEventSink));
            print_json(&resolve_json(&input, &resolver)?)?;
        }
        Commands::Validate { files } => {
            let config = MediaConfig::from_env()?;
            let media = media_from_paths(&files)?;
            let result = validate_media(&media, &config);
            print_json(&result)?;
            if !result.is_valid {
                anyhow::bail!("Validation failed");
            }
        }
        Commands::Publish {
            title,
            content,
            category,
            scope,
            author_id,
            class_id,
            grade,
            cache_dir,
            stage,
            no_compress,
            files,
        } => {
            let category = PostCategory::parse(&category)?;
            let scope = UploadScope::parse(&scope)?;
            let config = MediaConfig::from_env()?;
            let client = ApiClient::from_env().context(
                "Failed to create API client. Set CAMPUSPOST_API_TOKEN and CAMPUSPOST_API_URL (or API_URL)",
            )?;
            let cache_dir =
                cache_dir.unwrap_or_else(|| std::env::temp_dir().join("campuspost-cache"));

            let events = Arc::new(TracingEventSink);
            let mut pipeline = PostPipeline::new(config, Arc::new(client), events.clone());
            if !no_compress {
                pipeline = pipeline.with_compressor(Arc::new(JpegCompressor::new(&cache_dir)));
            }

            let staged = StagedFiles::new(events);
            let mut media = media_from_paths(&files)?;
            if stage {
                if let Err(e) = stage_media(&staged, &mut media, &cache_dir).await {
                    staged.cleanup().await;
                    return Err(e);
                }
            }

            let draft = PostDraft {
                title,
                content,
                category,
                author_id,
                scope,
                class_id,
                grade,
                media,
            };

            let outcome = pipeline
                .publish_with_progress(&draft, |p| {
                    tracing::info!(
                        current = p.current,
                        total = p.total,
                        stage = ?p.stage,
                        "Progress"
                    );
                })
                .await;
            staged.cleanup().await;
            print_json(&outcome?.response)?;
        }
    }

    Ok(())
}
