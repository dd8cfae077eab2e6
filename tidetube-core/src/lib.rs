//! Tidetube Core - Video artifact lifecycle for a federated video platform
//!
//! Every stored video is accompanied by derived files: a torrent for
//! WebTorrent distribution, a magnet link, a thumbnail and a preview image.
//! This crate generates, names and removes those files, and handles the
//! split between videos owned by this instance and videos mirrored from
//! federation peers.

pub mod artifacts;
pub mod config;
pub mod library;
pub mod media;
pub mod serializer;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
pub mod torrent;
pub mod tracing_setup;
pub mod video;

// Re-export main types for convenient access
pub use artifacts::{ArtifactError, ArtifactPipeline, ArtifactSource, DeletionError};
pub use config::TidetubeConfig;
pub use library::{StoreError, VideoLibrary, VideoStore, VideoUpload};
pub use media::{FfmpegFrameExtractor, FrameExtractor, MediaError};
pub use serializer::{ArtifactReadError, ClientVideo, PeerVideoPayload, VideoSerializer};
pub use torrent::{MagnetUri, TorrentError};
pub use video::{ValidationError, Video, VideoId};

/// Errors surfaced by library operations.
#[derive(Debug, thiserror::Error)]
pub enum TidetubeError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Artifact generation failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Artifact removal failed: {0}")]
    Deletion(#[from] DeletionError),

    #[error("Artifact export failed: {0}")]
    ArtifactRead(#[from] ArtifactReadError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Video {id} not found")]
    VideoNotFound { id: VideoId },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TidetubeError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            TidetubeError::Validation(e) => format!("Invalid {}: {}", e.field, e.reason),
            TidetubeError::Artifact(e) => match e {
                ArtifactError::Torrent(TorrentError::EmptySource { path }) => {
                    format!("Video file is empty: {path}")
                }
                ArtifactError::Image {
                    source: MediaError::ToolUnavailable { binary, .. },
                    ..
                } => format!("{binary} is not installed"),
                ArtifactError::SourceMismatch { .. } => {
                    "Video origin does not match the supplied media".to_string()
                }
                _ => "Could not generate video artifacts".to_string(),
            },
            TidetubeError::Deletion(_) => "Could not remove video files".to_string(),
            TidetubeError::ArtifactRead(ArtifactReadError::NotOwned { id }) => {
                format!("Video {id} belongs to another instance")
            }
            TidetubeError::ArtifactRead(_) => "Could not read video thumbnail".to_string(),
            TidetubeError::Media(MediaError::ToolUnavailable { binary, .. }) => {
                format!("{binary} is not installed")
            }
            TidetubeError::Media(_) => "Could not inspect media file".to_string(),
            TidetubeError::Store(_) => "Video database error occurred".to_string(),
            TidetubeError::VideoNotFound { id } => format!("Video {id} not found"),
            TidetubeError::Configuration { .. } => "Configuration error occurred".to_string(),
            TidetubeError::Serialization(_) => "Could not encode output".to_string(),
            TidetubeError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TidetubeError::Validation(_)
                | TidetubeError::VideoNotFound { .. }
                | TidetubeError::Configuration { .. }
                | TidetubeError::ArtifactRead(ArtifactReadError::NotOwned { .. })
                | TidetubeError::Artifact(ArtifactError::Torrent(TorrentError::EmptySource { .. }))
        )
    }
}

pub type Result<T> = std::result::Result<T, TidetubeError>;
