//! Concurrent creation and deletion of a video's artifacts
//!
//! Every unit of work runs as its own tokio task. A failure is reported to
//! the caller but never cancels its siblings: tasks already spawned run to
//! completion and keep whatever they wrote.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::{JoinError, JoinHandle};

use super::generator;
use super::{
    ArtifactError, ArtifactKind, ArtifactPaths, ArtifactRemover, ArtifactSource, DeletionError,
    RemovalOutcome,
};
use crate::config::{DeletionPolicy, TidetubeConfig};
use crate::media::{FrameExtractor, MediaError};
use crate::torrent::TorrentUrls;
use crate::video::Video;

type RemovalTask = (ArtifactKind, JoinHandle<Result<RemovalOutcome, DeletionError>>);

/// Orchestrates artifact generation and cleanup per video.
///
/// Holds no per-video state, so one pipeline serves any number of videos
/// concurrently.
#[derive(Clone)]
pub struct ArtifactPipeline {
    config: Arc<TidetubeConfig>,
    extractor: Arc<dyn FrameExtractor>,
    remover: ArtifactRemover,
}

impl ArtifactPipeline {
    pub fn new(config: Arc<TidetubeConfig>, extractor: Arc<dyn FrameExtractor>) -> Self {
        let remover = ArtifactRemover::new(config.storage.clone());
        Self {
            config,
            extractor,
            remover,
        }
    }

    /// Generates every artifact `video` needs and returns the updated video.
    ///
    /// Owned videos take a media file and get a torrent, thumbnail and
    /// preview built concurrently; the returned video carries the info hash.
    /// Remote videos take the peer's base64 thumbnail and get only that.
    ///
    /// # Errors
    /// - `ArtifactError::SourceMismatch` - Source kind does not fit the origin
    /// - `ArtifactError::Torrent` - Torrent could not be built
    /// - `ArtifactError::Image` - Thumbnail or preview could not be written
    /// - `ArtifactError::TaskPanicked` - A generation task aborted
    pub async fn create_artifacts(
        &self,
        video: Video,
        source: ArtifactSource,
    ) -> Result<Video, ArtifactError> {
        match (video.is_owned(), source) {
            (true, ArtifactSource::MediaFile(media)) => {
                self.create_owned_artifacts(video, media).await
            }
            (false, ArtifactSource::PeerThumbnail(thumbnail)) => {
                self.create_remote_artifacts(video, thumbnail).await
            }
            (owned, source) => Err(ArtifactError::SourceMismatch {
                origin: if owned { "owned" } else { "remote" },
                source_kind: source.describe(),
            }),
        }
    }

    async fn create_owned_artifacts(
        &self,
        video: Video,
        media: PathBuf,
    ) -> Result<Video, ArtifactError> {
        let storage = &self.config.storage;
        let paths = ArtifactPaths::for_video(&video, storage);
        let urls = TorrentUrls {
            announce: self.config.webserver.tracker_url(),
            web_seed: format!(
                "{}{}{}",
                self.config.webserver.http_url(),
                self.config.static_paths.webseed,
                video.video_filename()
            ),
        };

        tracing::info!("Generating artifacts for video {} ({})", video.id, video.name);

        let torrent = tokio::spawn(generator::generate_torrent(
            media.clone(),
            paths.torrent.clone(),
            video.video_filename(),
            urls,
        ));
        let thumbnail = tokio::spawn(generator::generate_thumbnail(
            Arc::clone(&self.extractor),
            media.clone(),
            storage.thumbnails_dir.clone(),
            video.thumbnail_name(),
            self.config.media.thumbnail_size,
        ));
        let preview = tokio::spawn(generator::generate_preview(
            Arc::clone(&self.extractor),
            media,
            storage.previews_dir.clone(),
            video.preview_name(),
        ));

        let (torrent, thumbnail, preview) = tokio::join!(torrent, thumbnail, preview);

        let torrent = settle(ArtifactKind::Torrent, torrent, ArtifactError::from);
        let thumbnail = settle(
            ArtifactKind::Thumbnail,
            thumbnail,
            image_error(ArtifactKind::Thumbnail),
        );
        let preview = settle(
            ArtifactKind::Preview,
            preview,
            image_error(ArtifactKind::Preview),
        );

        let outcome = match (torrent, thumbnail, preview) {
            (Ok(info_hash), Ok(_), Ok(_)) => Ok(info_hash),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err(e),
        };

        match outcome {
            Ok(info_hash) => {
                tracing::info!(
                    "Artifacts ready for video {} with info hash {}",
                    video.id,
                    info_hash
                );
                Ok(video.with_info_hash(info_hash.to_string()))
            }
            Err(e) => {
                tracing::error!("Artifact generation failed for video {}: {}", video.id, e);
                if self.config.pipeline.cleanup_on_failure {
                    self.discard_generated(&paths).await;
                }
                Err(e)
            }
        }
    }

    async fn create_remote_artifacts(
        &self,
        video: Video,
        thumbnail_base64: String,
    ) -> Result<Video, ArtifactError> {
        tracing::info!(
            "Storing peer thumbnail for remote video {} from {}",
            video.id,
            video.origin_host().unwrap_or_default()
        );

        generator::persist_remote_thumbnail(
            thumbnail_base64,
            self.config.storage.thumbnails_dir.clone(),
            video.thumbnail_name(),
        )
        .await
        .map_err(image_error(ArtifactKind::Thumbnail))?;

        Ok(video)
    }

    /// Best-effort removal of whatever a failed creation left behind.
    async fn discard_generated(&self, paths: &ArtifactPaths) {
        for kind in [
            ArtifactKind::Torrent,
            ArtifactKind::Thumbnail,
            ArtifactKind::Preview,
        ] {
            match super::remover::remove_file(kind, paths.get(kind)).await {
                Ok(RemovalOutcome::Removed) => {
                    tracing::debug!("Discarded {} of failed creation", kind);
                }
                Ok(RemovalOutcome::AlreadyAbsent) => {}
                Err(e) => tracing::warn!("Could not discard {}: {}", kind, e),
            }
        }
    }

    /// Removes every artifact the video's origin implies.
    ///
    /// The thumbnail is always removed; owned videos also lose their source
    /// file, torrent and preview. Missing files are logged and ignored.
    ///
    /// With [`DeletionPolicy::FailFast`] the first failure to complete is
    /// returned at once and the remaining removals continue detached. With
    /// [`DeletionPolicy::BestEffort`] all removals are awaited and the first
    /// failure in dispatch order is returned.
    ///
    /// # Errors
    /// - `DeletionError::Io` - A file exists but could not be removed
    /// - `DeletionError::TaskPanicked` - A removal task aborted
    pub async fn delete_artifacts(&self, video: &Video) -> Result<(), DeletionError> {
        let mut kinds = vec![ArtifactKind::Thumbnail];
        if video.is_owned() {
            kinds.extend([
                ArtifactKind::SourceFile,
                ArtifactKind::Torrent,
                ArtifactKind::Preview,
            ]);
        }

        tracing::info!("Removing {} artifacts of video {}", kinds.len(), video.id);

        let shared = Arc::new(video.clone());
        let tasks: Vec<RemovalTask> = kinds
            .into_iter()
            .map(|kind| {
                let remover = self.remover.clone();
                let video = Arc::clone(&shared);
                let handle = tokio::spawn(async move {
                    let outcome = match kind {
                        ArtifactKind::Thumbnail => remover.remove_thumbnail(&video).await,
                        ArtifactKind::SourceFile => remover.remove_source_file(&video).await,
                        ArtifactKind::Torrent => remover.remove_torrent(&video).await,
                        ArtifactKind::Preview => remover.remove_preview(&video).await,
                    };
                    log_removal(kind, &video, &outcome);
                    outcome
                });
                (kind, handle)
            })
            .collect();

        match self.config.pipeline.deletion_policy {
            DeletionPolicy::FailFast => fail_fast(tasks).await,
            DeletionPolicy::BestEffort => best_effort(tasks).await,
        }
    }
}

/// Returns on the first failure; dropped handles leave their tasks running.
async fn fail_fast(tasks: Vec<RemovalTask>) -> Result<(), DeletionError> {
    let mut pending: FuturesUnordered<_> = tasks
        .into_iter()
        .map(|(kind, handle)| async move { (kind, handle.await) })
        .collect();

    while let Some((kind, joined)) = pending.next().await {
        settle_removal(kind, joined)?;
    }
    Ok(())
}

async fn best_effort(tasks: Vec<RemovalTask>) -> Result<(), DeletionError> {
    let (kinds, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    let joined = futures::future::join_all(handles).await;

    let mut first_error = None;
    for (kind, result) in kinds.into_iter().zip(joined) {
        if let Err(e) = settle_removal(kind, result)
            && first_error.is_none()
        {
            first_error = Some(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn settle_removal(
    kind: ArtifactKind,
    joined: Result<Result<RemovalOutcome, DeletionError>, JoinError>,
) -> Result<RemovalOutcome, DeletionError> {
    joined.map_err(|e| DeletionError::TaskPanicked {
        kind,
        reason: e.to_string(),
    })?
}

fn log_removal(kind: ArtifactKind, video: &Video, outcome: &Result<RemovalOutcome, DeletionError>) {
    match outcome {
        Ok(RemovalOutcome::Removed) => {}
        Ok(RemovalOutcome::AlreadyAbsent) => {
            tracing::warn!("{} of video {} was already absent", kind, video.id);
        }
        Err(e) => tracing::error!("Removing {} of video {} failed: {}", kind, video.id, e),
    }
}

/// Flattens a joined generation task into the pipeline error type.
fn settle<T, E>(
    kind: ArtifactKind,
    joined: Result<Result<T, E>, JoinError>,
    map_err: impl FnOnce(E) -> ArtifactError,
) -> Result<T, ArtifactError> {
    match joined {
        Ok(result) => result.map_err(map_err),
        Err(e) => Err(ArtifactError::TaskPanicked {
            kind,
            reason: e.to_string(),
        }),
    }
}

fn image_error(kind: ArtifactKind) -> impl FnOnce(MediaError) -> ArtifactError {
    move |source| ArtifactError::Image { kind, source }
}
