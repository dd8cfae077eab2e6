//! Derived files of a video and their lifecycle.
//!
//! Owned videos get a torrent, a thumbnail and a preview extracted from the
//! uploaded media. Remote videos only get the thumbnail their origin pod sent.
//! [`ArtifactPipeline`] creates these files before a record is stored and
//! removes them before a record is dropped.

pub mod generator;
pub mod pipeline;
pub mod remover;

use std::fmt;
use std::path::PathBuf;

pub use pipeline::ArtifactPipeline;
pub use remover::ArtifactRemover;

use crate::config::StorageConfig;
use crate::media::MediaError;
use crate::torrent::TorrentError;
use crate::video::Video;

/// One derived file of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    SourceFile,
    Torrent,
    Thumbnail,
    Preview,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::SourceFile => "source file",
            ArtifactKind::Torrent => "torrent",
            ArtifactKind::Thumbnail => "thumbnail",
            ArtifactKind::Preview => "preview",
        })
    }
}

/// Input the artifacts of a new video are generated from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// Uploaded media, for owned videos
    MediaFile(PathBuf),
    /// Base64 thumbnail sent by the origin pod, for remote videos
    PeerThumbnail(String),
}

impl ArtifactSource {
    fn describe(&self) -> &'static str {
        match self {
            ArtifactSource::MediaFile(_) => "media file",
            ArtifactSource::PeerThumbnail(_) => "peer thumbnail",
        }
    }
}

/// Absolute locations of every artifact a video may have.
///
/// Remote videos never have a source file, torrent or preview on disk, but
/// their paths are still well defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub source_file: PathBuf,
    pub torrent: PathBuf,
    pub thumbnail: PathBuf,
    pub preview: PathBuf,
}

impl ArtifactPaths {
    /// Resolves the artifact names of `video` inside the storage directories.
    pub fn for_video(video: &Video, storage: &StorageConfig) -> Self {
        Self {
            source_file: storage.videos_dir.join(video.video_filename()),
            torrent: storage.torrents_dir.join(video.torrent_name()),
            thumbnail: storage.thumbnails_dir.join(video.thumbnail_name()),
            preview: storage.previews_dir.join(video.preview_name()),
        }
    }

    /// Path of a single artifact.
    pub fn get(&self, kind: ArtifactKind) -> &PathBuf {
        match kind {
            ArtifactKind::SourceFile => &self.source_file,
            ArtifactKind::Torrent => &self.torrent,
            ArtifactKind::Thumbnail => &self.thumbnail,
            ArtifactKind::Preview => &self.preview,
        }
    }
}

/// Result of removing one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    /// Nothing was on disk; not a failure
    AlreadyAbsent,
}

/// Failures while generating artifacts. Any of them blocks persistence.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Torrent generation failed: {0}")]
    Torrent(#[from] TorrentError),

    #[error("{kind} generation failed: {source}")]
    Image {
        kind: ArtifactKind,
        #[source]
        source: MediaError,
    },

    /// The source does not match the video's origin
    #[error("Cannot generate artifacts of {origin} video from a {source_kind}")]
    SourceMismatch {
        origin: &'static str,
        source_kind: &'static str,
    },

    #[error("{kind} task did not complete: {reason}")]
    TaskPanicked { kind: ArtifactKind, reason: String },
}

/// Failures while removing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    #[error("Failed to remove {kind} at {path}: {source}")]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} removal task did not complete: {reason}")]
    TaskPanicked { kind: ArtifactKind, reason: String },
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::test_fixtures::sample_details;
    use crate::video::VideoExtension;

    #[test]
    fn test_owned_paths_share_identity() {
        let storage = StorageConfig::rooted_at(Path::new("/srv"));
        let video = Video::owned(VideoExtension::Webm, sample_details("Clip"));
        let paths = ArtifactPaths::for_video(&video, &storage);
        let id = video.id;

        assert_eq!(paths.source_file, PathBuf::from(format!("/srv/videos/{id}.webm")));
        assert_eq!(paths.torrent, PathBuf::from(format!("/srv/torrents/{id}.torrent")));
        assert_eq!(paths.thumbnail, PathBuf::from(format!("/srv/thumbnails/{id}.jpg")));
        assert_eq!(paths.preview, PathBuf::from(format!("/srv/previews/{id}.jpg")));
        assert_eq!(paths.get(ArtifactKind::Preview), &paths.preview);
    }

    #[test]
    fn test_error_messages_name_the_artifact() {
        let err = ArtifactError::Image {
            kind: ArtifactKind::Preview,
            source: MediaError::MissingOutput {
                path: PathBuf::from("/tmp/p.jpg"),
            },
        };
        assert!(err.to_string().starts_with("preview generation failed"));

        let err = ArtifactError::SourceMismatch {
            origin: "remote",
            source_kind: ArtifactSource::MediaFile(PathBuf::new()).describe(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot generate artifacts of remote video from a media file"
        );
    }
}
