//! Pixelwash Core - untrusted image sanitization.
//!
//! Pixelwash takes arbitrary bytes that claim to be an image and either turns
//! them into a fresh, metadata-free PNG no larger than a configured bound, or
//! reports why it could not.
//!
//! # Architecture
//!
//! ```text
//! bytes → primary decode ─┬─ ok ─────────► clamp → reduce → re-encode PNG
//!                         └─ failed ─► fallback decode → resize → re-encode PNG
//!                                           └─ failed ─► opt out / malformed report
//! ```
//!
//! Only raw RGBA pixels survive into the output; every chunk, profile and
//! comment of the input is dropped.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixelwash_core::{Config, Pixelwash, ProcessOptions};
//!
//! #[tokio::main]
//! async fn main() -> pixelwash_core::Result<()> {
//!     let pixelwash = Pixelwash::new(Config::load()?);
//!
//!     let report = pixelwash
//!         .process_file("./upload.bin".as_ref(), &ProcessOptions::default())
//!         .await;
//!     println!("{}", report.state.label);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, DecodeError, PipelineError, PipelineResult, PixelwashError, Result};
pub use output::{write_artifact, OutputFormat, OutputWriter};
pub use pipeline::{DiscoveredFile, Sanitizer};
pub use report::{JobReport, StateLabel};
pub use types::{EncodedPng, InputImage, SanitizationOutcome, SanitizedImage, Tool};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline::{FileDiscovery, Hasher, Validator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-file options for [`Pixelwash::process_file`].
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Declared MIME type of the input, used as a fallback decode hint
    pub content_type: Option<String>,
    /// Where to write the `safe_png` artifact; `None` reports without writing
    pub out_dir: Option<PathBuf>,
}

/// Pixelwash processor - the main entry point for sanitization.
pub struct Pixelwash {
    config: Config,
    sanitizer: Arc<Sanitizer>,
    validator: Validator,
    discovery: FileDiscovery,
}

impl Pixelwash {
    /// Create a new Pixelwash instance with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Pixelwash v{}", VERSION);
        Self {
            sanitizer: Arc::new(Sanitizer::new(&config)),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(),
            config,
        }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sanitize an in-memory input synchronously.
    pub fn sanitize_bytes(&self, input: &InputImage<'_>) -> SanitizationOutcome {
        self.sanitizer.sanitize(input)
    }

    /// Find input files at a path (single file or directory tree).
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Sanitize one file and shape the result into a report.
    ///
    /// Never fails: harness problems become a report in the `error` state.
    pub async fn process_file(&self, path: &Path, options: &ProcessOptions) -> JobReport {
        let source = path.display().to_string();
        match self.try_process_file(path, options).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Failed: {:?} - {}", path, e);
                JobReport::from_error(source, &e)
            }
        }
    }

    async fn try_process_file(
        &self,
        path: &Path,
        options: &ProcessOptions,
    ) -> PipelineResult<JobReport> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        self.validator.validate(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let input_hash = Hasher::content_hash(&bytes);
        tracing::trace!("  Read+hash: {:?}", start.elapsed());

        let outcome = self.sanitize_blocking(path, bytes, options).await?;

        let mut report = JobReport::from_outcome(path.display().to_string(), input_hash, &outcome);
        if let (Some(image), Some(dir)) = (outcome.sanitized(), options.out_dir.as_deref()) {
            let artifact = write_artifact(dir, &image.png)?;
            report = report.with_artifact_path(artifact);
        }

        tracing::debug!(
            "Finished {:?} as {} in {:?}",
            path,
            report.state.label,
            start.elapsed()
        );
        Ok(report)
    }

    /// Run the synchronous pipeline on the blocking pool, bounded by the
    /// decode timeout. A timed-out task keeps its thread until it returns.
    async fn sanitize_blocking(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        options: &ProcessOptions,
    ) -> PipelineResult<SanitizationOutcome> {
        let sanitizer = Arc::clone(&self.sanitizer);
        let content_type = options.content_type.clone();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        let timeout_ms = self.config.limits.decode_timeout_ms;

        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            tokio::task::spawn_blocking(move || {
                let mut input = InputImage::new(&bytes);
                if let Some(content_type) = content_type.as_deref() {
                    input = input.with_content_type(content_type);
                }
                if let Some(file_name) = file_name.as_deref() {
                    input = input.with_file_name(file_name);
                }
                sanitizer.sanitize(&input)
            }),
        )
        .await;

        match result {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(PipelineError::Task {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "sanitize".to_string(),
                timeout_ms,
            }),
        }
    }
}
