//! Video records and the persistence boundary.
//!
//! [`VideoLibrary`] runs the artifact pipeline explicitly around every store
//! write: artifacts are generated before a record is inserted and removed
//! before a record is dropped.

pub mod json_file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
pub use json_file::JsonFileStore;
pub use memory::MemoryVideoStore;

use crate::artifacts::{ArtifactPipeline, ArtifactSource};
use crate::config::TidetubeConfig;
use crate::media::FrameExtractor;
use crate::serializer::{ClientVideo, PeerVideoPayload, VideoSerializer};
use crate::torrent::MagnetUri;
use crate::video::{ValidationError, Video, VideoDetails, VideoExtension, VideoId, VideoValidator};
use crate::{Result, TidetubeError};

/// Persistence of video records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateId` - A record with the same id exists
    /// - `StoreError::Io` - Backing storage could not be written
    async fn insert(&self, video: Video) -> std::result::Result<(), StoreError>;

    /// Loads a record by local id.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Backing storage could not be read
    async fn get(&self, id: VideoId) -> std::result::Result<Option<Video>, StoreError>;

    /// Drops a record and returns it, if present.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Backing storage could not be written
    async fn remove(&self, id: VideoId) -> std::result::Result<Option<Video>, StoreError>;

    /// Returns every record, oldest first.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Backing storage could not be read
    async fn list(&self) -> std::result::Result<Vec<Video>, StoreError>;
}

/// Errors raised by video stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Video {id} already stored")]
    DuplicateId { id: VideoId },

    #[error("IO error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt video manifest: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A local upload waiting to be published.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    /// Media file to copy into storage; its extension picks the container
    pub source: PathBuf,
    pub details: VideoDetails,
}

/// Videos of this instance, owned and mirrored.
pub struct VideoLibrary<S: VideoStore> {
    config: Arc<TidetubeConfig>,
    pipeline: ArtifactPipeline,
    serializer: VideoSerializer,
    validator: VideoValidator,
    store: S,
}

impl<S: VideoStore> VideoLibrary<S> {
    pub fn new(config: Arc<TidetubeConfig>, extractor: Arc<dyn FrameExtractor>, store: S) -> Self {
        Self {
            pipeline: ArtifactPipeline::new(Arc::clone(&config), extractor),
            serializer: VideoSerializer::new(Arc::clone(&config)),
            validator: VideoValidator::new(config.media.allowed_extensions.clone()),
            config,
            store,
        }
    }

    /// Publishes a local upload as an owned video.
    ///
    /// The media is copied into the video directory under its final name,
    /// artifacts are generated from that copy, and only then is the record
    /// stored.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::Validation` - Upload violates a field constraint
    /// - `TidetubeError::Io` - Media could not be staged
    /// - `TidetubeError::Artifact` - Artifact generation failed
    /// - `TidetubeError::Store` - Record could not be stored; with cleanup on
    ///   failure enabled its artifacts and staged media are removed
    pub async fn publish(&self, upload: VideoUpload) -> Result<Video> {
        let extension = VideoExtension::from_path(&upload.source).ok_or_else(|| {
            ValidationError::new(
                "extname",
                format!("unsupported container: {}", upload.source.display()),
            )
        })?;
        self.validator
            .validate_upload(extension, &upload.details)?;

        self.config.storage.ensure_directories().await?;

        let video = Video::owned(extension, upload.details);
        let staged = self.config.storage.videos_dir.join(video.video_filename());
        tokio::fs::copy(&upload.source, &staged).await?;
        tracing::debug!("Staged {} as {}", upload.source.display(), staged.display());

        let video = match self
            .pipeline
            .create_artifacts(video, ArtifactSource::MediaFile(staged.clone()))
            .await
        {
            Ok(video) => video,
            Err(e) => {
                if self.config.pipeline.cleanup_on_failure
                    && let Err(remove_err) = tokio::fs::remove_file(&staged).await
                {
                    tracing::warn!(
                        "Could not remove staged media {}: {}",
                        staged.display(),
                        remove_err
                    );
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.insert(video.clone()).await {
            self.discard_unstored(&video).await;
            return Err(e.into());
        }
        tracing::info!("Published video {} ({})", video.id, video.name);
        Ok(video)
    }

    /// Mirrors a video announced by a federation peer.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::Validation` - Payload violates a field constraint
    /// - `TidetubeError::Artifact` - Thumbnail could not be stored
    /// - `TidetubeError::Store` - Record could not be stored
    pub async fn import_remote(&self, payload: PeerVideoPayload) -> Result<Video> {
        self.validator.validate_peer_payload(&payload)?;
        let video = Video::from_peer_payload(&payload)?;

        self.config.storage.ensure_directories().await?;

        let video = self
            .pipeline
            .create_artifacts(video, ArtifactSource::PeerThumbnail(payload.thumbnail_base64))
            .await?;

        if let Err(e) = self.store.insert(video.clone()).await {
            self.discard_unstored(&video).await;
            return Err(e.into());
        }
        tracing::info!(
            "Imported remote video {} from {}",
            video.id,
            video.origin_host().unwrap_or_default()
        );
        Ok(video)
    }

    /// Drops the artifacts of a video whose record could not be stored,
    /// when cleanup on failure is enabled.
    async fn discard_unstored(&self, video: &Video) {
        if !self.config.pipeline.cleanup_on_failure {
            return;
        }
        if let Err(e) = self.pipeline.delete_artifacts(video).await {
            tracing::warn!("Could not discard artifacts of unstored video {}: {}", video.id, e);
        }
    }

    /// Removes a video and all its artifacts.
    ///
    /// The record stays when artifact removal fails.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::VideoNotFound` - No such video
    /// - `TidetubeError::Deletion` - An artifact could not be removed
    /// - `TidetubeError::Store` - Record could not be dropped
    pub async fn remove(&self, id: VideoId) -> Result<Video> {
        let video = self.get(id).await?;
        self.pipeline.delete_artifacts(&video).await?;
        self.store.remove(id).await?;
        tracing::info!("Removed video {} ({})", video.id, video.name);
        Ok(video)
    }

    /// Loads a video.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::VideoNotFound` - No such video
    /// - `TidetubeError::Store` - Store could not be read
    pub async fn get(&self, id: VideoId) -> Result<Video> {
        self.store
            .get(id)
            .await?
            .ok_or(TidetubeError::VideoNotFound { id })
    }

    /// Lists every video, oldest first.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::Store` - Store could not be read
    pub async fn list(&self) -> Result<Vec<Video>> {
        Ok(self.store.list().await?)
    }

    /// Client projection of a video.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::VideoNotFound` - No such video
    pub async fn client_view(&self, id: VideoId) -> Result<ClientVideo> {
        let video = self.get(id).await?;
        Ok(self.serializer.to_client_json(&video))
    }

    /// Federation payload of an owned video.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::VideoNotFound` - No such video
    /// - `TidetubeError::ArtifactRead` - Video is remote or its thumbnail is unreadable
    pub async fn export(&self, id: VideoId) -> Result<PeerVideoPayload> {
        let video = self.get(id).await?;
        Ok(self.serializer.to_peer_export(&video).await?)
    }

    /// Magnet link of a video.
    ///
    /// # Errors
    ///
    /// - `TidetubeError::VideoNotFound` - No such video
    pub async fn magnet(&self, id: VideoId) -> Result<MagnetUri> {
        let video = self.get(id).await?;
        Ok(MagnetUri::build(&video, &self.config))
    }
}
