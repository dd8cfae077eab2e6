//! Removal of individual artifact files

use std::io::ErrorKind;
use std::path::Path;

use super::{ArtifactKind, ArtifactPaths, DeletionError, RemovalOutcome};
use crate::config::StorageConfig;
use crate::video::Video;

/// Deletes artifact files of a video from storage.
#[derive(Debug, Clone)]
pub struct ArtifactRemover {
    storage: StorageConfig,
}

impl ArtifactRemover {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    /// Removes `<local id>.jpg` from the thumbnail directory.
    ///
    /// # Errors
    /// - `DeletionError::Io` - File exists but could not be removed
    pub async fn remove_thumbnail(&self, video: &Video) -> Result<RemovalOutcome, DeletionError> {
        self.remove(ArtifactKind::Thumbnail, video).await
    }

    /// Removes the uploaded media file.
    ///
    /// # Errors
    /// - `DeletionError::Io` - File exists but could not be removed
    pub async fn remove_source_file(
        &self,
        video: &Video,
    ) -> Result<RemovalOutcome, DeletionError> {
        self.remove(ArtifactKind::SourceFile, video).await
    }

    /// Removes the torrent file.
    ///
    /// # Errors
    /// - `DeletionError::Io` - File exists but could not be removed
    pub async fn remove_torrent(&self, video: &Video) -> Result<RemovalOutcome, DeletionError> {
        self.remove(ArtifactKind::Torrent, video).await
    }

    /// Removes the preview image.
    ///
    /// # Errors
    /// - `DeletionError::Io` - File exists but could not be removed
    pub async fn remove_preview(&self, video: &Video) -> Result<RemovalOutcome, DeletionError> {
        self.remove(ArtifactKind::Preview, video).await
    }

    /// Removes one artifact of `video`.
    ///
    /// # Errors
    /// - `DeletionError::Io` - File exists but could not be removed
    pub async fn remove(
        &self,
        kind: ArtifactKind,
        video: &Video,
    ) -> Result<RemovalOutcome, DeletionError> {
        let paths = ArtifactPaths::for_video(video, &self.storage);
        remove_file(kind, paths.get(kind)).await
    }
}

/// Removes a file, treating a missing file as success.
///
/// # Errors
/// - `DeletionError::Io` - Any failure other than the file being absent
pub async fn remove_file(kind: ArtifactKind, path: &Path) -> Result<RemovalOutcome, DeletionError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed {} {}", kind, path.display());
            Ok(RemovalOutcome::Removed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(RemovalOutcome::AlreadyAbsent),
        Err(source) => Err(DeletionError::Io {
            kind,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::test_fixtures::sample_details;
    use crate::video::VideoExtension;

    #[tokio::test]
    async fn test_remove_existing_then_absent() {
        let temp_dir = tempdir().unwrap();
        let storage = StorageConfig::rooted_at(temp_dir.path());
        storage.ensure_directories().await.unwrap();

        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));
        let torrent = storage.torrents_dir.join(video.torrent_name());
        tokio::fs::write(&torrent, b"d4:infodee").await.unwrap();

        let remover = ArtifactRemover::new(storage);
        assert_eq!(
            remover.remove_torrent(&video).await.unwrap(),
            RemovalOutcome::Removed
        );
        assert!(!torrent.exists());
        assert_eq!(
            remover.remove_torrent(&video).await.unwrap(),
            RemovalOutcome::AlreadyAbsent
        );
    }

    #[tokio::test]
    async fn test_missing_directory_counts_as_absent() {
        let temp_dir = tempdir().unwrap();
        let remover = ArtifactRemover::new(StorageConfig::rooted_at(&temp_dir.path().join("none")));
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));

        for outcome in [
            remover.remove_thumbnail(&video).await,
            remover.remove_source_file(&video).await,
            remover.remove_preview(&video).await,
        ] {
            assert_eq!(outcome.unwrap(), RemovalOutcome::AlreadyAbsent);
        }
    }

    #[tokio::test]
    async fn test_directory_in_place_of_file_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("thumb.jpg");
        tokio::fs::create_dir(&path).await.unwrap();

        let result = remove_file(ArtifactKind::Thumbnail, &path).await;
        assert!(matches!(
            result,
            Err(DeletionError::Io {
                kind: ArtifactKind::Thumbnail,
                ..
            })
        ));
    }
}
