//! JSON projections of videos for API clients and federation peers.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TidetubeConfig;
use crate::media::{MediaError, read_base64_image};
use crate::torrent::MagnetUri;
use crate::video::{Origin, ValidationError, Video, VideoDetails, VideoExtension, VideoId};

/// Video as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientVideo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `host:port` of the pod hosting the video
    pub pod_url: String,
    pub is_local: bool,
    pub magnet_uri: String,
    pub author: String,
    pub duration: u32,
    pub tags: Vec<String>,
    pub thumbnail_path: String,
    pub created_date: DateTime<Utc>,
}

/// Video as sent to federation peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerVideoPayload {
    pub name: String,
    pub description: String,
    pub magnet_uri: String,
    pub pod_url: String,
    pub remote_id: String,
    pub author: String,
    pub duration: u32,
    pub thumbnail_base64: String,
    pub tags: Vec<String>,
    pub created_date: DateTime<Utc>,
    /// Container extension with leading dot, e.g. `.mp4`
    pub extname: String,
}

impl PeerVideoPayload {
    /// User-facing attributes carried by the payload.
    pub fn details(&self) -> VideoDetails {
        VideoDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            duration: self.duration,
            tags: self.tags.iter().cloned().collect(),
        }
    }
}

/// The on-disk thumbnail of an owned video could not be exported.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactReadError {
    #[error("Video {id} is not owned by this instance")]
    NotOwned { id: VideoId },

    #[error("Cannot read thumbnail {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
}

/// Builds client and peer projections from stored videos.
#[derive(Debug, Clone)]
pub struct VideoSerializer {
    config: Arc<TidetubeConfig>,
}

impl VideoSerializer {
    pub fn new(config: Arc<TidetubeConfig>) -> Self {
        Self { config }
    }

    /// Client projection; pure apart from reading configuration.
    pub fn to_client_json(&self, video: &Video) -> ClientVideo {
        let pod_url = match &video.origin {
            Origin::Owned => self.config.webserver.host_with_port(),
            Origin::Remote { origin_host, .. } => origin_host.clone(),
        };

        ClientVideo {
            id: video.id.to_string(),
            name: video.name.clone(),
            description: video.description.clone(),
            pod_url,
            is_local: video.is_owned(),
            magnet_uri: MagnetUri::build(video, &self.config).to_string(),
            author: video.author.clone(),
            duration: video.duration,
            tags: video.tags.iter().cloned().collect(),
            thumbnail_path: format!(
                "{}{}",
                self.config.static_paths.thumbnails,
                video.thumbnail_name()
            ),
            created_date: video.created_at,
        }
    }

    /// Payload announcing an owned video to peers, thumbnail inlined.
    ///
    /// # Errors
    /// - `ArtifactReadError::NotOwned` - Remote videos are never re-exported
    /// - `ArtifactReadError::Unreadable` - Thumbnail missing or unreadable
    pub async fn to_peer_export(
        &self,
        video: &Video,
    ) -> Result<PeerVideoPayload, ArtifactReadError> {
        if !video.is_owned() {
            return Err(ArtifactReadError::NotOwned { id: video.id });
        }

        let path = self
            .config
            .storage
            .thumbnails_dir
            .join(video.thumbnail_name());
        let thumbnail_base64 = read_base64_image(&path).await.map_err(|source| {
            tracing::error!("Cannot read thumbnail of video {}: {}", video.id, source);
            ArtifactReadError::Unreadable {
                path: path.clone(),
                source,
            }
        })?;

        Ok(PeerVideoPayload {
            name: video.name.clone(),
            description: video.description.clone(),
            magnet_uri: MagnetUri::build(video, &self.config).to_string(),
            pod_url: self.config.webserver.host_with_port(),
            remote_id: video.id.to_string(),
            author: video.author.clone(),
            duration: video.duration,
            thumbnail_base64,
            tags: video.tags.iter().cloned().collect(),
            created_date: video.created_at,
            extname: video.extension.to_string(),
        })
    }
}

impl Video {
    /// Reconstructs the remote copy of a peer's video.
    ///
    /// The copy gets a fresh local id; its info hash comes from the payload's
    /// magnet link.
    ///
    /// # Errors
    /// - `ValidationError` - Unknown extension or magnet link without a valid info hash
    pub fn from_peer_payload(payload: &PeerVideoPayload) -> Result<Self, ValidationError> {
        let extension = payload
            .extname
            .parse::<VideoExtension>()
            .map_err(|e| ValidationError::new("extname", e))?;

        let info_hash = MagnetUri::parse(&payload.magnet_uri)
            .and_then(|magnet| magnet.parsed_info_hash())
            .map_err(|e| ValidationError::new("magnetUri", e.to_string()))?;

        Ok(Video::remote(
            payload.remote_id.clone(),
            payload.pod_url.clone(),
            extension,
            payload.details(),
            payload.created_date,
            info_hash.to_string(),
        ))
    }
}
