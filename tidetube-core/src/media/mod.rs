//! Image artifacts and media inspection.
//!
//! Frame extraction and duration probing go through the [`FrameExtractor`]
//! trait so the artifact pipeline can run against ffmpeg in production and a
//! static fixture in tests.

pub mod ffmpeg;
pub mod image;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use ffmpeg::FfmpegFrameExtractor;
pub use image::{decode_base64_image, read_base64_image};

use crate::config::ThumbnailSize;

/// Errors raised while extracting, decoding or probing media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The ffmpeg or ffprobe binary could not be started.
    #[error("{binary} not available: {source}")]
    ToolUnavailable {
        binary: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{binary} failed with exit code {exit_code:?}: {stderr}")]
    ToolFailed {
        binary: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Probe output did not contain a usable duration.
    #[error("Failed to read duration from probe output: {reason}")]
    InvalidProbeOutput { reason: String },

    /// Extraction finished but produced no image.
    #[error("No frame written to {path}")]
    MissingOutput { path: PathBuf },

    /// Base64 image payload could not be decoded.
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// I/O error occurred during a specific operation.
    #[error("IO error during {operation}: {source}")]
    IoErrorWithOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// A single frame to write as a JPEG.
#[derive(Debug, Clone)]
pub struct FrameRequest<'a> {
    pub source: &'a Path,
    pub output_dir: &'a Path,
    pub file_name: &'a str,
    /// Scale to this size; `None` keeps the source resolution
    pub size: Option<ThumbnailSize>,
}

impl FrameRequest<'_> {
    /// Full path of the image to write.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.file_name)
    }
}

/// Media tooling used by the artifact pipeline
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Writes one representative frame of the source as an image.
    ///
    /// Every call for the same source picks the same instant, so a thumbnail
    /// and a preview differ only in resolution.
    ///
    /// # Errors
    /// - `MediaError::ToolUnavailable` - Extraction backend missing
    /// - `MediaError::ToolFailed` - Extraction failed
    /// - `MediaError::MissingOutput` - Backend reported success but wrote nothing
    async fn extract_frame(&self, request: FrameRequest<'_>) -> MediaResult<PathBuf>;

    /// Returns the media duration in whole seconds, floored.
    ///
    /// # Errors
    /// - `MediaError::ToolUnavailable` - Probe backend missing
    /// - `MediaError::ToolFailed` - Probe failed
    /// - `MediaError::InvalidProbeOutput` - No duration reported
    async fn probe_duration(&self, source: &Path) -> MediaResult<u32>;
}
